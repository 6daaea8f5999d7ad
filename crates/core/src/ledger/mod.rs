//! Resumable per-item status ledger.
//!
//! The ledger is a JSON array persisted as a whole: every save serializes the
//! entire entry set to a sibling temp file and renames it over the target, so
//! a concurrent reader never observes a partial write. Re-discovery merges
//! into the existing set instead of overwriting it, which is what makes runs
//! resumable across restarts.

mod failures;
mod store;
mod types;

pub use failures::{FailedItem, FailureList};
pub use store::{JsonLedger, LedgerError, LedgerStore};
pub use types::{ItemStatus, LedgerEntry};
