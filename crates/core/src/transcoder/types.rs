//! Transcode request, progress and outcome types.

use std::path::PathBuf;

/// One transcode: stream locator in, finished file out.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    /// Identity key of the item being transcoded.
    pub key: String,
    /// Human-readable label for logs and progress.
    pub label: String,
    /// Time-limited stream locator to read from.
    pub locator: String,
    /// Destination file path.
    pub dest: PathBuf,
}

/// A point-in-time progress report for a running transcode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeProgress {
    /// Identity key of the item being transcoded.
    pub key: String,
    /// Completion percentage in `[0, 100]`, monotonically non-decreasing
    /// within one transcode.
    pub percent: f32,
    /// Output position, in seconds.
    pub out_time_secs: f64,
    /// Total stream duration in seconds, once known.
    pub duration_secs: Option<f64>,
}

/// Successful transcode outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    /// The process ran to completion and the destination file exists.
    Completed { bytes: u64, elapsed_ms: u64 },
    /// The destination already existed; no process was spawned.
    Skipped,
}
