//! Error types for the transcoder module.

use thiserror::Error;

/// Errors that can occur during a transcode.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The external process could not be started at all.
    #[error("Failed to spawn transcode process: {0}")]
    SpawnError(std::io::Error),

    /// The process ran but exited with a failure status.
    #[error("Transcode process failed (exit code {code:?})")]
    ProcessError {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// The process exceeded the configured wall-clock limit and was killed.
    #[error("Transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error outside the process itself (directories, cleanup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates a process failure error with captured stderr output.
    pub fn process_error(code: Option<i32>, stderr: String) -> Self {
        Self::ProcessError {
            code,
            stderr: if stderr.is_empty() { None } else { Some(stderr) },
        }
    }

    /// Short machine-readable failure reason, used in failure records.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::SpawnError(_) => "spawn_error",
            Self::ProcessError { .. } => "process_error",
            Self::Timeout { .. } => "timeout",
            Self::Io(_) => "io_error",
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ProcessError { .. } | Self::SpawnError(_)
        )
    }
}
