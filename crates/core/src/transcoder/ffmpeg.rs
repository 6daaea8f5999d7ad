//! FFmpeg-based transcoder implementation.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{TranscodeOutcome, TranscodeProgress, TranscodeRequest};

/// Transcoder that shells out to ffmpeg in stream-copy mode.
///
/// The stream is remuxed, never re-encoded: `-c copy` plus the ADTS-to-ASC
/// bitstream filter is what turns an HLS/TS stream into a playable mp4.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    fn build_args(&self, request: &TranscodeRequest) -> Vec<String> {
        let mut args = vec![
            "-reconnect".to_string(),
            "1".to_string(),
            "-reconnect_streamed".to_string(),
            "1".to_string(),
            "-reconnect_delay_max".to_string(),
            self.config.reconnect_delay_max_secs.to_string(),
            "-i".to_string(),
            request.locator.clone(),
            "-c".to_string(),
            "copy".to_string(),
            "-bsf:a".to_string(),
            "aac_adtstoasc".to_string(),
            "-max_muxing_queue_size".to_string(),
            "2048".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-y".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push(request.dest.to_string_lossy().to_string());
        args
    }

    async fn remove_partial(&self, request: &TranscodeRequest) {
        match tokio::fs::remove_file(&request.dest).await {
            Ok(()) => debug!("Removed partial output {}", request.dest.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove partial output {}: {}",
                request.dest.display(),
                e
            ),
        }
    }

    async fn run(
        &self,
        request: &TranscodeRequest,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let start = Instant::now();

        if let Some(parent) = request.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(request);
        debug!("Spawning {} for '{}'", self.config.ffmpeg_path.display(), request.label);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TranscodeError::SpawnError)?;

        // Progress arrives as key=value lines on stdout; stderr is drained
        // concurrently so the process can never block on a full pipe.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(stderr) = stderr {
                let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            }
            buf
        });

        let key = request.key.clone();
        let result = tokio::time::timeout(self.config.timeout(), async {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                let mut tracker = ProgressTracker::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(progress) = tracker.observe_line(&key, &line) {
                        if let Some(ref tx) = progress_tx {
                            let _ = tx.try_send(progress);
                        }
                    }
                }
            }
            child.wait().await
        })
        .await;

        match result {
            Ok(Ok(status)) if status.success() => {
                let stderr_output = stderr_task.await.unwrap_or_default();
                if !stderr_output.trim().is_empty() {
                    debug!("ffmpeg stderr for '{}': {}", request.label, stderr_output.trim());
                }
                let meta = tokio::fs::metadata(&request.dest).await.map_err(|_| {
                    TranscodeError::process_error(status.code(), "Output file not created".into())
                })?;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                info!(
                    "Transcode of '{}' completed in {}ms ({} bytes)",
                    request.label,
                    elapsed_ms,
                    meta.len()
                );
                Ok(TranscodeOutcome::Completed {
                    bytes: meta.len(),
                    elapsed_ms,
                })
            }
            Ok(Ok(status)) => {
                let stderr_output = stderr_task.await.unwrap_or_default();
                self.remove_partial(request).await;
                Err(TranscodeError::process_error(
                    status.code(),
                    stderr_output.trim().to_string(),
                ))
            }
            Ok(Err(e)) => {
                stderr_task.abort();
                self.remove_partial(request).await;
                Err(TranscodeError::Io(e))
            }
            Err(_) => {
                let _ = child.kill().await;
                stderr_task.abort();
                self.remove_partial(request).await;
                Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        request: TranscodeRequest,
        progress_tx: Option<mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        if tokio::fs::try_exists(&request.dest).await.unwrap_or(false) {
            info!("Destination exists, skipping '{}'", request.label);
            return Ok(TranscodeOutcome::Skipped);
        }
        self.run(&request, progress_tx).await
    }
}

/// Parses ffmpeg progress lines into clamped, monotonic percentages.
///
/// Understands `duration=<secs>` and `out_time_ms=<microseconds>` lines;
/// everything else is ignored. Percent never decreases within one transcode
/// and never exceeds 100, whatever the raw numbers say.
struct ProgressTracker {
    duration_secs: Option<f64>,
    out_time_secs: f64,
    last_percent: f32,
}

impl ProgressTracker {
    fn new() -> Self {
        Self {
            duration_secs: None,
            out_time_secs: 0.0,
            last_percent: 0.0,
        }
    }

    fn observe_line(&mut self, key: &str, line: &str) -> Option<TranscodeProgress> {
        let (field, value) = line.trim().split_once('=')?;
        match field {
            "duration" => {
                if let Ok(secs) = value.trim().parse::<f64>() {
                    if secs > 0.0 {
                        self.duration_secs = Some(secs);
                    }
                }
                None
            }
            "out_time_ms" => {
                let micros = value.trim().parse::<f64>().ok()?;
                self.out_time_secs = micros / 1_000_000.0;
                let percent = match self.duration_secs {
                    Some(d) if d > 0.0 => ((self.out_time_secs / d) * 100.0).min(100.0) as f32,
                    _ => 0.0,
                };
                self.last_percent = self.last_percent.max(percent);
                Some(TranscodeProgress {
                    key: key.to_string(),
                    percent: self.last_percent,
                    out_time_secs: self.out_time_secs,
                    duration_secs: self.duration_secs,
                })
            }
            _ => None,
        }
    }
}
