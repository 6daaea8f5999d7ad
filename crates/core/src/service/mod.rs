//! Control surface tying discovery, the ledger and the pipeline together.
//!
//! All operations return immediately; long-running work happens in spawned
//! tasks and reports through the event stream. Discovery and download runs
//! are each single-flight: starting one while it is already running is an
//! error, not a second run.

mod runner;
mod types;

pub use runner::DownloaderService;
pub use types::{ServiceError, ServiceStatus};
