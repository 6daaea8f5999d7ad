//! Course media acquisition pipeline.
//!
//! Discovers items from a course catalog, resolves time-limited stream
//! locators, and drains them through a bounded pool of ffmpeg transcode
//! workers, with a resumable JSON ledger and a push-only event stream.

pub mod catalog;
pub mod config;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod pipeline;
pub mod resolver;
pub mod service;
pub mod testing;
pub mod transcoder;

pub use catalog::{CatalogError, CatalogItem, CatalogSource};
pub use config::{load_config, load_config_from_str, Config, ConfigError};
pub use events::{EventEnvelope, EventHandle, LogLevel, PipelineEvent};
pub use ledger::{
    FailedItem, FailureList, ItemStatus, JsonLedger, LedgerEntry, LedgerError, LedgerStore,
};
pub use pipeline::{
    BatchResult, CountersSnapshot, DownloadPipeline, PipelineConfig, PipelineCounters,
};
pub use resolver::{LocatorResolver, LocatorService, ResolverConfig, ResolverError};
pub use service::{DownloaderService, ServiceError, ServiceStatus};
pub use transcoder::{
    FfmpegTranscoder, TranscodeError, TranscodeOutcome, TranscodeProgress, TranscodeRequest,
    Transcoder, TranscoderConfig,
};
