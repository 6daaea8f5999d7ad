//! Stream locator resolution.
//!
//! Locators are time-limited and resolved one item at a time by an external
//! collaborator that drives a session-bound source. [`LocatorResolver`] wraps
//! that collaborator with per-attempt timeouts and a recovery call between
//! attempts, since a stuck session is the most common failure mode.

mod config;
mod error;
mod retrying;
mod traits;

pub use config::ResolverConfig;
pub use error::ResolverError;
pub use retrying::LocatorResolver;
pub use traits::LocatorService;
