//! Download pipeline: a bounded queue drained by a fixed worker pool.
//!
//! The producer walks the ledger in catalog order, resolves locators one at
//! a time and feeds jobs into a bounded channel; workers pull jobs and run
//! transcodes with bounded retries. The channel capacity is the queue's
//! high-water mark, so a slow pool applies backpressure to resolution
//! instead of letting time-limited locators pile up and expire.

mod config;
mod runner;
mod types;

pub use config::PipelineConfig;
pub use runner::DownloadPipeline;
pub use types::{BatchResult, CountersSnapshot, DownloadJob, PipelineCounters};
