//! Catalog discovery collaborator.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::types::CatalogItem;

/// Errors from catalog discovery.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog source could not be reached at all.
    #[error("Catalog source unavailable: {0}")]
    Unavailable(String),

    /// The catalog structure could not be read.
    #[error("Catalog walk failed: {0}")]
    WalkFailed(String),
}

/// External collaborator that walks the course structure and produces items.
///
/// The walk is expected to be slow and sequential (it drives a remote,
/// session-bound UI); implementations should poll `stop` between units of
/// work and return early with whatever was collected so far.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Walks the catalog and returns discovered items in catalog order.
    async fn fetch(&self, stop: Arc<AtomicBool>) -> Result<Vec<CatalogItem>, CatalogError>;
}
