//! Persistent list of items whose attempts were exhausted.
//!
//! Kept separate from the main ledger so a retry pass can re-queue exactly
//! the items that ran out of attempts, with the reason that sank them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::catalog::CatalogItem;

use super::store::LedgerError;

/// One exhausted item and why it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub reason: String,
    #[serde(default = "Utc::now")]
    pub failed_at: DateTime<Utc>,
}

/// JSON-file store of exhausted items.
pub struct FailureList {
    path: PathBuf,
    records: Mutex<Vec<FailedItem>>,
}

impl FailureList {
    /// Opens the list at `path`, loading any persisted records. A missing or
    /// corrupt file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::load(&path).await;
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    async fn load(path: &Path) -> Vec<FailedItem> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read failure list {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Corrupt failure list {}, starting empty: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, records: &[FailedItem]) -> Result<(), LedgerError> {
        if records.is_empty() {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
        let json = serde_json::to_vec_pretty(records)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Records an exhausted item. An earlier record for the same identity is
    /// replaced so the list never grows duplicates across retry passes.
    pub async fn record(&self, item: CatalogItem, reason: &str) -> Result<(), LedgerError> {
        let mut records = self.records.lock().await;
        let key = item.key();
        records.retain(|r| r.item.key() != key);
        records.push(FailedItem {
            item,
            reason: reason.to_string(),
            failed_at: Utc::now(),
        });
        self.persist(&records).await
    }

    /// Snapshot of all recorded failures.
    pub async fn all(&self) -> Vec<FailedItem> {
        self.records.lock().await.clone()
    }

    /// Takes all records out of the list, clearing the backing file.
    ///
    /// The retry pass drains the list up front; items that fail again get
    /// re-recorded by their workers.
    pub async fn drain(&self) -> Result<Vec<FailedItem>, LedgerError> {
        let mut records = self.records.lock().await;
        let drained = std::mem::take(&mut *records);
        self.persist(&records).await?;
        Ok(drained)
    }
}
