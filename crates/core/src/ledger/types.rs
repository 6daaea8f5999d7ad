//! Ledger entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{item_key, CatalogItem};

/// Per-item download status.
///
/// Advances `pending → downloading → {completed|failed}` within one attempt
/// sequence; an external retry pass may reset `failed` back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Downloading => "downloading",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }

    /// Whether this status is a terminal outcome of an attempt sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }
}

/// One persisted ledger entry; at most one per item identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// 1-based position in catalog order, reassigned on every merge.
    pub index: u32,
    pub title: String,
    pub part_num: u32,
    pub part_title: String,
    pub chapter_num: u32,
    pub chapter_title: String,
    #[serde(default)]
    pub chapter_prefix: Option<String>,
    #[serde(default)]
    pub clip_num: u32,
    pub status: ItemStatus,
    /// Time-limited stream locator, once resolved.
    #[serde(default)]
    pub locator: Option<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a fresh `pending` entry from a discovered item.
    pub fn from_item(item: &CatalogItem, index: u32) -> Self {
        Self {
            index,
            title: item.title.clone(),
            part_num: item.part_num,
            part_title: item.part_title.clone(),
            chapter_num: item.chapter_num,
            chapter_title: item.chapter_title.clone(),
            chapter_prefix: item.chapter_prefix.clone(),
            clip_num: item.clip_num,
            status: ItemStatus::Pending,
            locator: None,
            updated_at: Utc::now(),
        }
    }

    /// Stable identity key, same derivation as [`CatalogItem::key`].
    pub fn key(&self) -> String {
        item_key(self.part_num, self.chapter_num, self.clip_num, &self.title)
    }

    /// Reconstructs the catalog item this entry describes.
    pub fn item(&self) -> CatalogItem {
        CatalogItem {
            part_num: self.part_num,
            part_title: self.part_title.clone(),
            chapter_num: self.chapter_num,
            chapter_title: self.chapter_title.clone(),
            chapter_prefix: self.chapter_prefix.clone(),
            clip_num: self.clip_num,
            title: self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> CatalogItem {
        CatalogItem {
            part_num: 1,
            part_title: "Part One".to_string(),
            chapter_num: 2,
            chapter_title: "Ch 2 Basics".to_string(),
            chapter_prefix: Some("Ch2".to_string()),
            clip_num: 3,
            title: "Hello".to_string(),
        }
    }

    #[test]
    fn test_from_item_defaults_pending() {
        let entry = LedgerEntry::from_item(&sample_item(), 7);
        assert_eq!(entry.index, 7);
        assert_eq!(entry.status, ItemStatus::Pending);
        assert!(entry.locator.is_none());
    }

    #[test]
    fn test_entry_key_matches_item_key() {
        let item = sample_item();
        let entry = LedgerEntry::from_item(&item, 1);
        assert_eq!(entry.key(), item.key());
        assert_eq!(entry.item(), item);
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::Downloading).unwrap(),
            "\"downloading\""
        );
        let parsed: ItemStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, ItemStatus::Completed);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!ItemStatus::Pending.is_terminal());
        assert!(!ItemStatus::Downloading.is_terminal());
        assert!(ItemStatus::Completed.is_terminal());
        assert!(ItemStatus::Failed.is_terminal());
    }

    #[test]
    fn test_entry_serde_camel_case_and_defaults() {
        // Entries written by earlier versions may lack chapterPrefix/locator.
        let json = r#"{
            "index": 1,
            "title": "t",
            "partNum": 1,
            "partTitle": "p",
            "chapterNum": 1,
            "chapterTitle": "c",
            "clipNum": 1,
            "status": "pending"
        }"#;
        let entry: LedgerEntry = serde_json::from_str(json).unwrap();
        assert!(entry.chapter_prefix.is_none());
        assert!(entry.locator.is_none());
    }
}
