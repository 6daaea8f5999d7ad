use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, CatalogItem, CatalogSource};

/// Mock catalog source returning a fixed item set.
#[derive(Default)]
pub struct MockCatalogSource {
    items: RwLock<Vec<CatalogItem>>,
    fail_budget: RwLock<u32>,
    fetch_calls: RwLock<u32>,
}

impl MockCatalogSource {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: RwLock::new(items),
            ..Self::default()
        }
    }

    pub async fn set_items(&self, items: Vec<CatalogItem>) {
        *self.items.write().await = items;
    }

    /// Makes the next `count` fetches fail.
    pub async fn fail_next(&self, count: u32) {
        *self.fail_budget.write().await = count;
    }

    pub async fn fetch_calls(&self) -> u32 {
        *self.fetch_calls.read().await
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch(&self, stop: Arc<AtomicBool>) -> Result<Vec<CatalogItem>, CatalogError> {
        *self.fetch_calls.write().await += 1;

        {
            let mut budget = self.fail_budget.write().await;
            if *budget > 0 {
                *budget -= 1;
                return Err(CatalogError::Unavailable("scripted failure".to_string()));
            }
        }

        if stop.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }

        Ok(self.items.read().await.clone())
    }
}
