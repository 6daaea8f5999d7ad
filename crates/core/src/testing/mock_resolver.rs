use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::CatalogItem;
use crate::resolver::{LocatorService, ResolverError};

/// Mock locator service with scripted failures and call recording.
#[derive(Default)]
pub struct MockLocatorService {
    locator: RwLock<Option<String>>,
    fail_budget: RwLock<u32>,
    delay_ms: RwLock<u64>,
    resolve_calls: RwLock<Vec<CatalogItem>>,
    recover_calls: RwLock<u32>,
}

impl MockLocatorService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the locator every successful resolution returns.
    pub async fn set_locator(&self, locator: &str) {
        *self.locator.write().await = Some(locator.to_string());
    }

    /// Makes the next `count` resolutions fail.
    pub async fn fail_next(&self, count: u32) {
        *self.fail_budget.write().await = count;
    }

    /// Adds a delay to every resolution, for timeout tests.
    pub async fn set_delay_ms(&self, ms: u64) {
        *self.delay_ms.write().await = ms;
    }

    pub async fn resolve_calls(&self) -> usize {
        self.resolve_calls.read().await.len()
    }

    pub async fn recover_calls(&self) -> u32 {
        *self.recover_calls.read().await
    }
}

#[async_trait]
impl LocatorService for MockLocatorService {
    async fn resolve(&self, item: &CatalogItem) -> Result<String, ResolverError> {
        self.resolve_calls.write().await.push(item.clone());

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        {
            let mut budget = self.fail_budget.write().await;
            if *budget > 0 {
                *budget -= 1;
                return Err(ResolverError::unavailable("scripted failure"));
            }
        }

        self.locator
            .read()
            .await
            .clone()
            .ok_or(ResolverError::NoLocator)
    }

    async fn recover(&self) -> Result<(), ResolverError> {
        *self.recover_calls.write().await += 1;
        Ok(())
    }
}
