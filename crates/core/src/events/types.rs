use serde::{Deserialize, Serialize};

use crate::ledger::{ItemStatus, LedgerEntry};
use crate::pipeline::{BatchResult, CountersSnapshot};
use crate::transcoder::TranscodeProgress;

/// Severity of a log event forwarded to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Events published by the acquisition pipeline.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Human-readable activity line.
    Log { level: LogLevel, message: String },

    /// Per-item transcode progress.
    Progress(TranscodeProgress),

    /// Pipeline counter totals, emitted after every state change.
    Counters(CountersSnapshot),

    /// One item moved to a new status.
    StatusChange { key: String, status: ItemStatus },

    /// The full entry set changed (discovery merge, reset, clear).
    ListUpdate(Vec<LedgerEntry>),

    /// A download run finished.
    BatchCompleted(BatchResult),
}
