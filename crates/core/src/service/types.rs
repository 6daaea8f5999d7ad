use serde::Serialize;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::pipeline::CountersSnapshot;

/// Errors from service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The named operation is already running.
    #[error("{0} already in progress")]
    AlreadyRunning(&'static str),

    /// The operation cannot run while a download run is active.
    #[error("Cannot {0} while downloads are in progress")]
    Busy(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Point-in-time view of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub discovering: bool,
    pub downloading: bool,
    pub total_items: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    pub counters: CountersSnapshot,
}
