//! Pipeline producer and worker pool.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::catalog::output_path;
use crate::events::EventHandle;
use crate::ledger::{FailureList, ItemStatus, LedgerEntry, LedgerStore};
use crate::metrics;
use crate::resolver::LocatorResolver;
use crate::transcoder::{TranscodeOutcome, TranscodeRequest, Transcoder};

use super::config::PipelineConfig;
use super::types::{BatchResult, DownloadJob, PipelineCounters};

/// Shared collaborators handed to each worker.
#[derive(Clone)]
struct WorkerContext {
    config: PipelineConfig,
    ledger: Arc<dyn LedgerStore>,
    transcoder: Arc<dyn Transcoder>,
    failures: Arc<FailureList>,
    events: EventHandle,
    counters: Arc<PipelineCounters>,
}

/// Drains a set of ledger entries through a fixed pool of transcode workers.
pub struct DownloadPipeline {
    config: PipelineConfig,
    output_root: PathBuf,
    ledger: Arc<dyn LedgerStore>,
    resolver: Arc<LocatorResolver>,
    transcoder: Arc<dyn Transcoder>,
    failures: Arc<FailureList>,
    events: EventHandle,
    counters: Arc<PipelineCounters>,
}

impl DownloadPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        output_root: PathBuf,
        ledger: Arc<dyn LedgerStore>,
        resolver: Arc<LocatorResolver>,
        transcoder: Arc<dyn Transcoder>,
        failures: Arc<FailureList>,
        events: EventHandle,
        counters: Arc<PipelineCounters>,
    ) -> Self {
        Self {
            config,
            output_root,
            ledger,
            resolver,
            transcoder,
            failures,
            events,
            counters,
        }
    }

    /// Runs one batch: resolves and enqueues every entry, lets the pool drain
    /// the queue, and returns once all workers have finished.
    ///
    /// `stop` is cooperative: the producer checks it before each resolution
    /// and workers check it between jobs, so an in-flight transcode always
    /// runs to its own conclusion.
    pub async fn run(&self, entries: Vec<LedgerEntry>, stop: Arc<AtomicBool>) -> BatchResult {
        let total = entries.len();
        info!("Pipeline run starting: {} items, {} workers", total, self.config.workers);
        self.events.info(format!("Starting downloads for {} items", total));

        let (tx, rx) = mpsc::channel::<DownloadJob>(self.config.queue_high_water);
        let rx = Arc::new(Mutex::new(rx));

        let ctx = WorkerContext {
            config: self.config.clone(),
            ledger: Arc::clone(&self.ledger),
            transcoder: Arc::clone(&self.transcoder),
            failures: Arc::clone(&self.failures),
            events: self.events.clone(),
            counters: Arc::clone(&self.counters),
        };

        let mut workers = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let rx = Arc::clone(&rx);
            let ctx = ctx.clone();
            let stop = Arc::clone(&stop);
            workers.push(tokio::spawn(Self::worker_loop(id, rx, ctx, stop)));
        }
        // Workers hold the only receiver handles: once they all exit, a
        // producer blocked on a full queue gets a send error instead of
        // waiting forever.
        drop(rx);

        let mut result = self.produce(entries, tx, &stop).await;

        for worker in workers {
            match worker.await {
                Ok(worker_result) => {
                    result.completed += worker_result.completed;
                    result.skipped += worker_result.skipped;
                    result.failed += worker_result.failed;
                }
                Err(e) => warn!("Worker task panicked: {}", e),
            }
        }

        result.stopped = stop.load(Ordering::SeqCst);
        info!(
            "Pipeline run finished: {} completed, {} skipped, {} failed{}",
            result.completed,
            result.skipped,
            result.failed,
            if result.stopped { " (stopped)" } else { "" }
        );
        self.events.info(format!(
            "Downloads finished: {} completed, {} skipped, {} failed",
            result.completed, result.skipped, result.failed
        ));
        self.events.batch_completed(result);
        result
    }

    /// Resolves locators and feeds jobs into the queue. Dropping the sender
    /// when done (or on stop) is what lets the workers drain and exit.
    async fn produce(
        &self,
        entries: Vec<LedgerEntry>,
        tx: mpsc::Sender<DownloadJob>,
        stop: &Arc<AtomicBool>,
    ) -> BatchResult {
        let mut result = BatchResult::default();

        for entry in entries {
            if stop.load(Ordering::SeqCst) {
                info!("Stop requested, no further items will be queued");
                break;
            }

            let item = entry.item();
            let key = entry.key();
            let dest = output_path(&self.output_root, &item);

            // A finished file on disk settles the item without touching the
            // resolver or the queue.
            if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                debug!("Output exists for '{}', marking completed", item.title);
                if let Err(e) = self
                    .ledger
                    .set_status(&key, ItemStatus::Completed, None)
                    .await
                {
                    warn!("Failed to persist skip for '{}': {}", item.title, e);
                }
                self.counters.record_skipped();
                metrics::TRANSCODES_SKIPPED.inc();
                self.events.status_change(&key, ItemStatus::Completed);
                self.events.counters(self.counters.snapshot());
                result.skipped += 1;
                continue;
            }

            let locator = match entry.locator.clone() {
                Some(locator) => locator,
                None => match self.resolver.resolve(&item).await {
                    Ok(locator) => {
                        self.counters.record_resolved();
                        if let Err(e) = self.ledger.set_locator(&key, locator.clone()).await {
                            warn!("Failed to persist locator for '{}': {}", item.title, e);
                        }
                        locator
                    }
                    Err(e) => {
                        warn!("Giving up on '{}': {}", item.title, e);
                        self.events
                            .error(format!("Could not resolve '{}': {}", item.title, e));
                        if let Err(e) = self.ledger.set_status(&key, ItemStatus::Failed, None).await
                        {
                            warn!("Failed to persist failure for '{}': {}", item.title, e);
                        }
                        if let Err(e) = self.failures.record(item.clone(), "no_locator").await {
                            warn!("Failed to record failure for '{}': {}", item.title, e);
                        }
                        self.counters.record_failed();
                        metrics::TRANSCODES_FAILED.inc();
                        self.events.status_change(&key, ItemStatus::Failed);
                        self.events.counters(self.counters.snapshot());
                        result.failed += 1;
                        continue;
                    }
                },
            };

            let job = DownloadJob { item, locator, dest };
            self.counters.record_queued();
            if tx.send(job).await.is_err() {
                // All workers gone; nothing more can be processed.
                warn!("Job queue closed before all items were queued");
                break;
            }
        }

        result
    }

    async fn worker_loop(
        id: usize,
        rx: Arc<Mutex<mpsc::Receiver<DownloadJob>>>,
        ctx: WorkerContext,
        stop: Arc<AtomicBool>,
    ) -> BatchResult {
        debug!("Worker {} started", id);
        metrics::ACTIVE_WORKERS.inc();
        let mut result = BatchResult::default();

        loop {
            if stop.load(Ordering::SeqCst) {
                debug!("Worker {} stopping on request", id);
                break;
            }

            // Lock only for the receive; processing runs unlocked so the
            // pool actually works in parallel.
            let job = { rx.lock().await.recv().await };
            let Some(job) = job else {
                break;
            };

            ctx.counters.record_dequeued();
            ctx.counters.job_started();
            Self::process_job(id, job, &ctx, &mut result).await;
            ctx.counters.job_finished();
            ctx.events.counters(ctx.counters.snapshot());
        }

        metrics::ACTIVE_WORKERS.dec();
        debug!("Worker {} finished", id);
        result
    }

    /// Runs one job to a terminal status, retrying transcodes up to the
    /// configured attempt count.
    async fn process_job(id: usize, job: DownloadJob, ctx: &WorkerContext, result: &mut BatchResult) {
        let key = job.item.key();

        // The producer checked for an existing file before queueing, but a
        // parallel worker may have finished the same path since.
        if tokio::fs::try_exists(&job.dest).await.unwrap_or(false) {
            debug!("Worker {}: output exists for '{}', skipping", id, job.item.title);
            if let Err(e) = ctx.ledger.set_status(&key, ItemStatus::Completed, None).await {
                warn!("Failed to persist skip for '{}': {}", job.item.title, e);
            }
            ctx.counters.record_skipped();
            metrics::TRANSCODES_SKIPPED.inc();
            ctx.events.status_change(&key, ItemStatus::Completed);
            result.skipped += 1;
            return;
        }

        if let Err(e) = ctx.ledger.set_status(&key, ItemStatus::Downloading, None).await {
            warn!("Failed to persist status for '{}': {}", job.item.title, e);
        }
        ctx.events.status_change(&key, ItemStatus::Downloading);
        ctx.events.info(format!("Downloading '{}'", job.item.title));

        let request = TranscodeRequest {
            key: key.clone(),
            label: job.item.title.clone(),
            locator: job.locator.clone(),
            dest: job.dest.clone(),
        };

        let max_attempts = ctx.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let (progress_tx, mut progress_rx) = mpsc::channel(32);
            let events = ctx.events.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    events.progress(progress);
                }
            });

            let timer = metrics::TRANSCODE_DURATION.start_timer();
            let outcome = ctx
                .transcoder
                .transcode(request.clone(), Some(progress_tx))
                .await;
            timer.observe_duration();
            let _ = forwarder.await;

            match outcome {
                Ok(outcome) => {
                    if let Err(e) = ctx.ledger.set_status(&key, ItemStatus::Completed, None).await {
                        warn!("Failed to persist completion for '{}': {}", job.item.title, e);
                    }
                    ctx.events.status_change(&key, ItemStatus::Completed);
                    match outcome {
                        TranscodeOutcome::Completed { bytes, elapsed_ms } => {
                            ctx.events.info(format!(
                                "Completed '{}' ({} bytes in {}ms)",
                                job.item.title, bytes, elapsed_ms
                            ));
                            ctx.counters.record_completed();
                            metrics::TRANSCODES_COMPLETED.inc();
                            result.completed += 1;
                        }
                        TranscodeOutcome::Skipped => {
                            ctx.counters.record_skipped();
                            metrics::TRANSCODES_SKIPPED.inc();
                            result.skipped += 1;
                        }
                    }
                    return;
                }
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    warn!(
                        "Transcode of '{}' failed (attempt {}/{}): {}",
                        job.item.title, attempt, max_attempts, e
                    );
                    ctx.events.warn(format!(
                        "Retrying '{}' (attempt {}/{}): {}",
                        job.item.title, attempt, max_attempts, e
                    ));
                    tokio::time::sleep(ctx.config.retry_delay()).await;
                }
                Err(e) => {
                    warn!(
                        "Transcode of '{}' failed permanently after {} attempts: {}",
                        job.item.title, attempt, e
                    );
                    ctx.events
                        .error(format!("Failed '{}': {}", job.item.title, e));
                    if let Err(persist_err) =
                        ctx.ledger.set_status(&key, ItemStatus::Failed, None).await
                    {
                        warn!(
                            "Failed to persist failure for '{}': {}",
                            job.item.title, persist_err
                        );
                    }
                    if let Err(record_err) =
                        ctx.failures.record(job.item.clone(), e.reason()).await
                    {
                        warn!(
                            "Failed to record failure for '{}': {}",
                            job.item.title, record_err
                        );
                    }
                    ctx.counters.record_failed();
                    metrics::TRANSCODES_FAILED.inc();
                    ctx.events.status_change(&key, ItemStatus::Failed);
                    result.failed += 1;
                    return;
                }
            }
        }
    }
}
