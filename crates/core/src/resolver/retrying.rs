use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::CatalogItem;

use super::config::ResolverConfig;
use super::error::ResolverError;
use super::traits::LocatorService;

/// Retrying wrapper around a [`LocatorService`].
///
/// Each attempt runs under the configured timeout. Between failed attempts
/// the underlying service gets a `recover()` call, which is allowed to fail
/// without consuming an attempt.
pub struct LocatorResolver {
    service: Arc<dyn LocatorService>,
    config: ResolverConfig,
}

impl LocatorResolver {
    pub fn new(service: Arc<dyn LocatorService>, config: ResolverConfig) -> Self {
        Self { service, config }
    }

    /// Resolves a locator for `item`, retrying up to the configured attempt
    /// count. Returns [`ResolverError::Exhausted`] once attempts run out.
    pub async fn resolve(&self, item: &CatalogItem) -> Result<String, ResolverError> {
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_attempts {
            debug!(
                "Resolving locator for '{}' (attempt {}/{})",
                item.title, attempt, self.config.max_attempts
            );

            let result = tokio::time::timeout(self.config.timeout(), self.service.resolve(item))
                .await
                .map_err(|_| ResolverError::Timeout(self.config.timeout_secs))
                .and_then(|r| r);

            match result {
                Ok(locator) => return Ok(locator),
                Err(e) => {
                    warn!(
                        "Locator resolution failed for '{}' (attempt {}/{}): {}",
                        item.title, attempt, self.config.max_attempts, e
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.config.max_attempts {
                if let Err(e) = self.service.recover().await {
                    warn!("Locator service recovery failed: {}", e);
                }
            }
        }

        Err(ResolverError::Exhausted {
            attempts: self.config.max_attempts,
            last: last_error,
        })
    }
}
