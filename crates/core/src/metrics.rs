//! Prometheus metrics for the acquisition pipeline.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge};

/// Items discovered across all discovery runs.
pub static ITEMS_DISCOVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_items_discovered_total",
        "Total catalog items discovered",
    )
    .unwrap()
});

/// Transcodes completed successfully.
pub static TRANSCODES_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_transcodes_completed_total",
        "Total transcodes completed successfully",
    )
    .unwrap()
});

/// Items skipped because the output file already existed.
pub static TRANSCODES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_transcodes_skipped_total",
        "Total items skipped because the output already existed",
    )
    .unwrap()
});

/// Items that failed after exhausting all attempts.
pub static TRANSCODES_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_transcodes_failed_total",
        "Total items that failed permanently",
    )
    .unwrap()
});

/// Wall-clock duration of individual transcode attempts.
pub static TRANSCODE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "clipfetch_transcode_duration_seconds",
            "Duration of transcode attempts",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
    )
    .unwrap()
});

/// Workers currently alive in the pool.
pub static ACTIVE_WORKERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("clipfetch_active_workers", "Workers currently running").unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_DISCOVERED.clone()),
        Box::new(TRANSCODES_COMPLETED.clone()),
        Box::new(TRANSCODES_SKIPPED.clone()),
        Box::new(TRANSCODES_FAILED.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
        Box::new(ACTIVE_WORKERS.clone()),
    ]
}
