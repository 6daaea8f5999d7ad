//! JSON-backed ledger store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::catalog::{sort_items, CatalogItem};

use super::types::{ItemStatus, LedgerEntry};

/// Errors from ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable per-item status store.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Snapshot of all entries, in catalog order.
    async fn entries(&self) -> Vec<LedgerEntry>;

    /// Merges a discovery run into the existing set and persists the result.
    ///
    /// Matching is by identity key: matched entries keep their `status` and
    /// `locator` and take fresh metadata; unmatched discovered items default
    /// to `pending`. Entries no longer present in the catalog are dropped.
    /// Indexes are reassigned from 1 in catalog order.
    async fn merge(&self, discovered: Vec<CatalogItem>) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Updates the status (and optionally the locator) of one entry and
    /// persists the full set. Unknown keys are ignored.
    async fn set_status(
        &self,
        key: &str,
        status: ItemStatus,
        locator: Option<String>,
    ) -> Result<(), LedgerError>;

    /// Records a resolved locator without touching the status.
    async fn set_locator(&self, key: &str, locator: String) -> Result<(), LedgerError>;

    /// Resets all `failed` entries back to `pending` for a retry pass.
    /// Returns the number of entries reset.
    async fn reset_failed(&self) -> Result<usize, LedgerError>;

    /// Drops all entries and removes the backing file.
    async fn clear(&self) -> Result<(), LedgerError>;
}

/// Ledger store persisting the whole entry set as one JSON array.
///
/// All mutation happens under one mutex: read set, modify, write set. The
/// write goes to a sibling temp file first and is renamed over the target,
/// so a concurrent reader of the file never sees a partial array.
pub struct JsonLedger {
    path: PathBuf,
    entries: Mutex<Vec<LedgerEntry>>,
}

impl JsonLedger {
    /// Opens the ledger at `path`, loading any persisted entries.
    ///
    /// A missing or corrupt store is treated as empty: resumability is an
    /// optimization, never a startup failure.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path).await;
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    async fn load(path: &Path) -> Vec<LedgerEntry> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read ledger {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<LedgerEntry>>(&raw) {
            Ok(entries) => {
                debug!("Loaded {} ledger entries from {}", entries.len(), path.display());
                entries
            }
            Err(e) => {
                warn!("Corrupt ledger {}, starting empty: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Persists `entries` atomically. Callers must hold the entries lock.
    async fn persist(&self, entries: &[LedgerEntry]) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(entries)?;

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
}

#[async_trait]
impl LedgerStore for JsonLedger {
    async fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().await.clone()
    }

    async fn merge(&self, mut discovered: Vec<CatalogItem>) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut entries = self.entries.lock().await;

        sort_items(&mut discovered);

        let merged: Vec<LedgerEntry> = discovered
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let index = idx as u32 + 1;
                let key = item.key();
                match entries.iter().find(|e| e.key() == key) {
                    Some(existing) => {
                        // Identity survives; status and locator carry over,
                        // everything else is refreshed from discovery.
                        let mut entry = LedgerEntry::from_item(item, index);
                        entry.status = existing.status;
                        entry.locator = existing.locator.clone();
                        entry.updated_at = existing.updated_at;
                        entry
                    }
                    None => LedgerEntry::from_item(item, index),
                }
            })
            .collect();

        self.persist(&merged).await?;
        *entries = merged.clone();
        Ok(merged)
    }

    async fn set_status(
        &self,
        key: &str,
        status: ItemStatus,
        locator: Option<String>,
    ) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.key() == key) {
            Some(entry) => {
                entry.status = status;
                if locator.is_some() {
                    entry.locator = locator;
                }
                entry.updated_at = Utc::now();
            }
            None => {
                debug!("Ledger update for unknown key, ignoring: {}", key);
                return Ok(());
            }
        }
        self.persist(&entries).await
    }

    async fn set_locator(&self, key: &str, locator: String) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.key() == key) {
            Some(entry) => {
                entry.locator = Some(locator);
                entry.updated_at = Utc::now();
            }
            None => {
                debug!("Locator update for unknown key, ignoring: {}", key);
                return Ok(());
            }
        }
        self.persist(&entries).await
    }

    async fn reset_failed(&self) -> Result<usize, LedgerError> {
        let mut entries = self.entries.lock().await;
        let mut reset = 0;
        for entry in entries.iter_mut() {
            if entry.status == ItemStatus::Failed {
                entry.status = ItemStatus::Pending;
                entry.updated_at = Utc::now();
                reset += 1;
            }
        }
        if reset > 0 {
            self.persist(&entries).await?;
        }
        Ok(reset)
    }

    async fn clear(&self) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
