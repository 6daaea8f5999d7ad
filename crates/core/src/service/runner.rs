//! Downloader service implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::config::Config;
use crate::events::{EventEnvelope, EventHandle};
use crate::ledger::{FailureList, ItemStatus, JsonLedger, LedgerEntry, LedgerStore};
use crate::metrics;
use crate::pipeline::{DownloadPipeline, PipelineCounters};
use crate::resolver::{LocatorResolver, LocatorService};
use crate::transcoder::Transcoder;

use super::types::{ServiceError, ServiceStatus};

/// Owns the long-lived state and exposes the control operations.
pub struct DownloaderService {
    source: Arc<dyn CatalogSource>,
    ledger: Arc<JsonLedger>,
    pipeline: Arc<DownloadPipeline>,
    failures: Arc<FailureList>,
    events: EventHandle,
    counters: Arc<PipelineCounters>,

    discovering: Arc<AtomicBool>,
    downloading: Arc<AtomicBool>,
    discovery_stop: Arc<AtomicBool>,
    download_stop: Arc<AtomicBool>,
}

impl DownloaderService {
    pub async fn new(
        config: Config,
        source: Arc<dyn CatalogSource>,
        locator_service: Arc<dyn LocatorService>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let ledger = Arc::new(JsonLedger::open(&config.ledger_path).await);
        let failures = Arc::new(FailureList::open(&config.failure_list_path).await);
        let events = EventHandle::default();
        let counters = Arc::new(PipelineCounters::default());
        let resolver = Arc::new(LocatorResolver::new(
            locator_service,
            config.resolver.clone(),
        ));

        let pipeline = Arc::new(DownloadPipeline::new(
            config.pipeline.clone(),
            config.output_root.clone(),
            ledger.clone() as Arc<dyn LedgerStore>,
            resolver,
            transcoder,
            failures.clone(),
            events.clone(),
            counters.clone(),
        ));

        Self {
            source,
            ledger,
            pipeline,
            failures,
            events,
            counters,
            discovering: Arc::new(AtomicBool::new(false)),
            downloading: Arc::new(AtomicBool::new(false)),
            discovery_stop: Arc::new(AtomicBool::new(false)),
            download_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts a catalog discovery run in the background.
    pub fn start_discovery(&self) -> Result<(), ServiceError> {
        if self.discovering.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning("Discovery"));
        }
        self.discovery_stop.store(false, Ordering::SeqCst);

        let source = Arc::clone(&self.source);
        let ledger = Arc::clone(&self.ledger);
        let events = self.events.clone();
        let discovering = Arc::clone(&self.discovering);
        let stop = Arc::clone(&self.discovery_stop);

        tokio::spawn(async move {
            info!("Discovery started");
            events.info("Discovery started");

            match source.fetch(Arc::clone(&stop)).await {
                Ok(items) if stop.load(Ordering::SeqCst) => {
                    // A partial walk must not be merged: entries absent from
                    // it would be dropped from the ledger.
                    info!("Discovery stopped after {} items, discarding", items.len());
                    events.info("Discovery stopped");
                }
                Ok(items) => {
                    metrics::ITEMS_DISCOVERED.inc_by(items.len() as u64);
                    match ledger.merge(items).await {
                        Ok(entries) => {
                            info!("Discovery finished: {} items", entries.len());
                            events.info(format!("Discovery finished: {} items", entries.len()));
                            events.list_update(entries);
                        }
                        Err(e) => {
                            warn!("Failed to merge discovered items: {}", e);
                            events.error(format!("Failed to save discovered items: {}", e));
                        }
                    }
                }
                Err(e) => {
                    warn!("Discovery failed: {}", e);
                    events.error(format!("Discovery failed: {}", e));
                }
            }

            discovering.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Requests a running discovery to stop at its next checkpoint.
    pub fn stop_discovery(&self) {
        if self.discovering.load(Ordering::SeqCst) {
            info!("Discovery stop requested");
            self.discovery_stop.store(true, Ordering::SeqCst);
        }
    }

    /// Starts a download run over every unfinished ledger entry.
    pub fn start_download(&self) -> Result<(), ServiceError> {
        if self.downloading.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning("Download"));
        }
        self.download_stop.store(false, Ordering::SeqCst);

        let ledger = Arc::clone(&self.ledger);
        let pipeline = Arc::clone(&self.pipeline);
        let events = self.events.clone();
        let downloading = Arc::clone(&self.downloading);
        let stop = Arc::clone(&self.download_stop);

        tokio::spawn(async move {
            let entries: Vec<LedgerEntry> = ledger
                .entries()
                .await
                .into_iter()
                .filter(|e| e.status != ItemStatus::Completed)
                .collect();

            pipeline.run(entries, stop).await;

            events.list_update(ledger.entries().await);
            downloading.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Requests the running download to wind down. In-flight transcodes run
    /// to their own conclusion; queued and unqueued items stay pending.
    pub fn stop_download(&self) {
        if self.downloading.load(Ordering::SeqCst) {
            info!("Download stop requested");
            self.download_stop.store(true, Ordering::SeqCst);
        }
    }

    /// Drops all ledger state, including the exhausted-items list.
    pub async fn clear_ledger(&self) -> Result<(), ServiceError> {
        if self.downloading.load(Ordering::SeqCst) {
            return Err(ServiceError::Busy("clear the ledger"));
        }
        self.ledger.clear().await?;
        self.failures.drain().await?;
        self.events.info("Ledger cleared");
        self.events.list_update(Vec::new());
        Ok(())
    }

    /// Resets every failed entry to pending and starts a download run over
    /// them. Returns the number of entries reset.
    pub async fn retry_failed(&self) -> Result<usize, ServiceError> {
        if self.downloading.load(Ordering::SeqCst) {
            return Err(ServiceError::Busy("retry failed items"));
        }

        let reset = self.ledger.reset_failed().await?;
        self.failures.drain().await?;

        if reset == 0 {
            self.events.info("No failed items to retry");
            return Ok(0);
        }

        self.events.info(format!("Retrying {} failed items", reset));
        self.events.list_update(self.ledger.entries().await);
        self.start_download()?;
        Ok(reset)
    }

    pub async fn status(&self) -> ServiceStatus {
        let entries = self.ledger.entries().await;
        let count =
            |status: ItemStatus| entries.iter().filter(|e| e.status == status).count();

        ServiceStatus {
            discovering: self.discovering.load(Ordering::SeqCst),
            downloading: self.downloading.load(Ordering::SeqCst),
            total_items: entries.len(),
            pending: count(ItemStatus::Pending) + count(ItemStatus::Downloading),
            completed: count(ItemStatus::Completed),
            failed: count(ItemStatus::Failed),
            counters: self.counters.snapshot(),
        }
    }

    /// Current ledger entries, in catalog order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.ledger.entries().await
    }

    /// Opens a subscription to the pipeline event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }
}
