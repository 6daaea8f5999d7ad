//! Pipeline job and accounting types.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::catalog::CatalogItem;

/// One unit of work handed from the producer to a worker.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub item: CatalogItem,
    /// Resolved stream locator, valid for a limited time.
    pub locator: String,
    /// Destination file path.
    pub dest: PathBuf,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchResult {
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Whether the run ended early because a stop was requested.
    pub stopped: bool,
}

/// Running totals across pipeline runs. Lock-free; shared by workers.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    resolved: AtomicU64,
    queued: AtomicU64,
    in_flight: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub resolved: u64,
    /// Jobs currently waiting in the queue.
    pub queued: u64,
    /// Jobs currently being processed by a worker.
    pub in_flight: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl PipelineCounters {
    pub fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dequeued(&self) {
        self.queued.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn job_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn job_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            resolved: self.resolved.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
