use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::transcoder::{
    TranscodeError, TranscodeOutcome, TranscodeProgress, TranscodeRequest, Transcoder,
};

/// Mock transcoder that writes real destination files on success.
///
/// Records every request and tracks the highest number of concurrently
/// running transcodes, which is how pool-size tests observe concurrency.
#[derive(Default)]
pub struct MockTranscoder {
    calls: RwLock<Vec<TranscodeRequest>>,
    fail_budget: RwLock<u32>,
    delay_ms: RwLock<u64>,
    current: AtomicUsize,
    max_seen: AtomicUsize,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` transcodes fail with a process error.
    pub async fn fail_next(&self, count: u32) {
        *self.fail_budget.write().await = count;
    }

    /// Adds a delay to every transcode, for concurrency and stop tests.
    pub async fn set_delay_ms(&self, ms: u64) {
        *self.delay_ms.write().await = ms;
    }

    /// All requests seen so far, in arrival order.
    pub async fn calls(&self) -> Vec<TranscodeRequest> {
        self.calls.read().await.clone()
    }

    /// Highest number of transcodes that ran at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(
        &self,
        request: TranscodeRequest,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        self.calls.write().await.push(request.clone());

        if tokio::fs::try_exists(&request.dest).await.unwrap_or(false) {
            return Ok(TranscodeOutcome::Skipped);
        }

        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if let Some(tx) = progress_tx {
            let _ = tx.try_send(TranscodeProgress {
                key: request.key.clone(),
                percent: 100.0,
                out_time_secs: 1.0,
                duration_secs: Some(1.0),
            });
        }

        self.current.fetch_sub(1, Ordering::SeqCst);

        {
            let mut budget = self.fail_budget.write().await;
            if *budget > 0 {
                *budget -= 1;
                return Err(TranscodeError::process_error(
                    Some(1),
                    "scripted failure".to_string(),
                ));
            }
        }

        if let Some(parent) = request.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&request.dest, b"mock media").await?;

        Ok(TranscodeOutcome::Completed {
            bytes: 10,
            elapsed_ms: delay,
        })
    }
}
