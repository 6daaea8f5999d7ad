use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::ledger::{ItemStatus, LedgerEntry};
use crate::pipeline::{BatchResult, CountersSnapshot};
use crate::transcoder::TranscodeProgress;

use super::types::{LogLevel, PipelineEvent};

/// Envelope wrapping a pipeline event with its emission time.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

/// Handle for emitting pipeline events.
///
/// Cheaply cloneable and shared across tasks. Backed by a broadcast channel:
/// every subscriber sees every event, slow subscribers lag and drop, and
/// emitting with no subscribers is a no-op.
#[derive(Clone)]
pub struct EventHandle {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventHandle {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Opens a new subscription receiving events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Emits an event to all current subscribers. Never blocks.
    pub fn emit(&self, event: PipelineEvent) {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        // Err means no subscribers, which is fine.
        let _ = self.tx.send(envelope);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(PipelineEvent::Log {
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn progress(&self, progress: TranscodeProgress) {
        self.emit(PipelineEvent::Progress(progress));
    }

    pub fn counters(&self, snapshot: CountersSnapshot) {
        self.emit(PipelineEvent::Counters(snapshot));
    }

    pub fn status_change(&self, key: impl Into<String>, status: ItemStatus) {
        self.emit(PipelineEvent::StatusChange {
            key: key.into(),
            status,
        });
    }

    pub fn list_update(&self, entries: Vec<LedgerEntry>) {
        self.emit(PipelineEvent::ListUpdate(entries));
    }

    pub fn batch_completed(&self, result: BatchResult) {
        self.emit(PipelineEvent::BatchCompleted(result));
    }
}

impl Default for EventHandle {
    fn default() -> Self {
        Self::new(256)
    }
}
