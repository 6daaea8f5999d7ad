//! Pipeline lifecycle integration tests.
//!
//! These cover the two canonical runs: a fresh batch that settles every item,
//! and a resumed batch that skips finished work and retries earlier failures.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::TempDir;

use clipfetch_core::catalog::output_path;
use clipfetch_core::testing::{MockLocatorService, MockTranscoder};
use clipfetch_core::{
    CatalogItem, DownloadPipeline, EventHandle, FailureList, ItemStatus, JsonLedger, LedgerStore,
    LocatorResolver, PipelineConfig, PipelineCounters, ResolverConfig,
};

struct TestHarness {
    ledger: Arc<JsonLedger>,
    locator_service: Arc<MockLocatorService>,
    transcoder: Arc<MockTranscoder>,
    failures: Arc<FailureList>,
    counters: Arc<PipelineCounters>,
    temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let ledger = Arc::new(JsonLedger::open(temp_dir.path().join("downloads.json")).await);
        let failures =
            Arc::new(FailureList::open(temp_dir.path().join("failed-downloads.json")).await);
        let locator_service = Arc::new(MockLocatorService::new());
        locator_service.set_locator("hls://stream").await;

        Self {
            ledger,
            locator_service,
            transcoder: Arc::new(MockTranscoder::new()),
            failures,
            counters: Arc::new(PipelineCounters::default()),
            temp_dir,
        }
    }

    fn output_root(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("videos")
    }

    fn create_pipeline(&self, config: PipelineConfig) -> DownloadPipeline {
        let resolver = Arc::new(LocatorResolver::new(
            Arc::clone(&self.locator_service) as Arc<dyn clipfetch_core::LocatorService>,
            ResolverConfig::default(),
        ));
        DownloadPipeline::new(
            config.with_retry_delay_secs(0),
            self.output_root(),
            Arc::clone(&self.ledger) as Arc<dyn clipfetch_core::LedgerStore>,
            resolver,
            Arc::clone(&self.transcoder) as Arc<dyn clipfetch_core::Transcoder>,
            Arc::clone(&self.failures),
            EventHandle::default(),
            Arc::clone(&self.counters),
        )
    }
}

fn catalog(count: u32) -> Vec<CatalogItem> {
    (1..=count)
        .map(|i| CatalogItem {
            part_num: 1 + (i - 1) / 4,
            part_title: format!("Part {}", 1 + (i - 1) / 4),
            chapter_num: 1,
            chapter_title: "Ch 1 Basics".to_string(),
            chapter_prefix: Some("Ch1".to_string()),
            clip_num: 1 + (i - 1) % 4,
            title: format!("Clip {}", i),
        })
        .collect()
}

#[tokio::test]
async fn test_fresh_run_settles_every_item() {
    let harness = TestHarness::new().await;
    let entries = harness.ledger.merge(catalog(6)).await.unwrap();

    let pipeline = harness.create_pipeline(PipelineConfig::default());
    let result = pipeline
        .run(entries, Arc::new(AtomicBool::new(false)))
        .await;

    assert_eq!(result.completed, 6);
    assert_eq!(result.failed, 0);

    let entries = harness.ledger.entries().await;
    assert!(entries.iter().all(|e| e.status == ItemStatus::Completed));

    // Every destination file is on disk, in the expected layout.
    for entry in &entries {
        let dest = output_path(&harness.output_root(), &entry.item());
        assert!(dest.exists(), "missing output {}", dest.display());
    }
}

#[tokio::test]
async fn test_resumed_run_skips_done_and_retries_failed() {
    let harness = TestHarness::new().await;
    harness.ledger.merge(catalog(4)).await.unwrap();

    // First run: the last two items fail every attempt.
    harness.transcoder.fail_next(100).await;
    let first_entries: Vec<_> = harness.ledger.entries().await.into_iter().skip(2).collect();
    let pipeline = harness.create_pipeline(PipelineConfig::default().with_max_attempts(2));
    let first = pipeline
        .run(first_entries, Arc::new(AtomicBool::new(false)))
        .await;
    assert_eq!(first.failed, 2);
    assert_eq!(harness.failures.all().await.len(), 2);

    // Run the first two to completion.
    harness.transcoder.fail_next(0).await;
    let done_entries: Vec<_> = harness.ledger.entries().await.into_iter().take(2).collect();
    let second = pipeline
        .run(done_entries, Arc::new(AtomicBool::new(false)))
        .await;
    assert_eq!(second.completed, 2);

    // Resume over the whole set: finished files short-circuit, the failed
    // pair goes through the transcoder again and succeeds this time.
    let calls_before = harness.transcoder.calls().await.len();
    let all_entries = harness.ledger.entries().await;
    let third = pipeline
        .run(all_entries, Arc::new(AtomicBool::new(false)))
        .await;

    assert_eq!(third.skipped, 2);
    assert_eq!(third.completed, 2);
    assert_eq!(harness.transcoder.calls().await.len(), calls_before + 2);

    let entries = harness.ledger.entries().await;
    assert!(entries.iter().all(|e| e.status == ItemStatus::Completed));
}

#[tokio::test]
async fn test_partially_downloaded_batch_skips_files_on_disk() {
    let harness = TestHarness::new().await;
    let entries = harness.ledger.merge(catalog(5)).await.unwrap();

    // Two outputs already exist from an earlier run.
    for entry in entries.iter().take(2) {
        let dest = output_path(&harness.output_root(), &entry.item());
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, b"earlier run").unwrap();
    }

    let pipeline = harness.create_pipeline(PipelineConfig::default());
    let result = pipeline
        .run(entries, Arc::new(AtomicBool::new(false)))
        .await;

    assert_eq!(result.skipped, 2);
    assert_eq!(result.completed, 3);
    assert_eq!(result.failed, 0);

    let entries = harness.ledger.entries().await;
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e.status == ItemStatus::Completed));
    // Only the three fresh items touched the resolver.
    assert_eq!(harness.locator_service.resolve_calls().await, 3);
}

#[tokio::test]
async fn test_rerun_of_finished_batch_is_all_skips() {
    let harness = TestHarness::new().await;
    let entries = harness.ledger.merge(catalog(3)).await.unwrap();

    let pipeline = harness.create_pipeline(PipelineConfig::default());
    pipeline
        .run(entries.clone(), Arc::new(AtomicBool::new(false)))
        .await;

    let resolve_calls = harness.locator_service.resolve_calls().await;
    let rerun = pipeline
        .run(
            harness.ledger.entries().await,
            Arc::new(AtomicBool::new(false)),
        )
        .await;

    assert_eq!(rerun.skipped, 3);
    assert_eq!(rerun.completed, 0);
    // No new resolutions were needed for finished files.
    assert_eq!(harness.locator_service.resolve_calls().await, resolve_calls);
}

#[tokio::test]
async fn test_ledger_survives_restart_between_runs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let ledger_path = temp_dir.path().join("downloads.json");

    {
        let ledger = JsonLedger::open(&ledger_path).await;
        let entries = ledger.merge(catalog(2)).await.unwrap();
        ledger
            .set_status(&entries[0].key(), ItemStatus::Completed, None)
            .await
            .unwrap();
    }

    // A new process sees the same state after a re-discovery merge.
    let ledger = JsonLedger::open(&ledger_path).await;
    let merged = ledger.merge(catalog(2)).await.unwrap();
    assert_eq!(merged[0].status, ItemStatus::Completed);
    assert_eq!(merged[1].status, ItemStatus::Pending);
}
