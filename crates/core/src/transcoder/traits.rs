use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::TranscodeError;
use super::types::{TranscodeOutcome, TranscodeProgress, TranscodeRequest};

/// Turns a stream locator into a finished local file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Runs one transcode. Progress reports, when a sender is given, are
    /// best-effort: a full channel drops the report rather than blocking
    /// the transcode.
    async fn transcode(
        &self,
        request: TranscodeRequest,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}
