use async_trait::async_trait;

use crate::catalog::CatalogItem;

use super::error::ResolverError;

/// External collaborator that turns a catalog item into a stream locator.
///
/// Implementations hold session state (an authenticated browsing context or
/// similar) and are expected to be serial: one resolution at a time.
#[async_trait]
pub trait LocatorService: Send + Sync {
    /// Resolves the time-limited stream locator for `item`.
    async fn resolve(&self, item: &CatalogItem) -> Result<String, ResolverError>;

    /// Attempts to restore the underlying session after a failed resolution.
    async fn recover(&self) -> Result<(), ResolverError>;
}
