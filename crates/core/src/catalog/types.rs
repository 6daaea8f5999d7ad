//! Catalog item types and identity.

use serde::{Deserialize, Serialize};

/// One addressable media unit discovered from the catalog.
///
/// Items are re-created on every discovery run; their identity is derived
/// from hierarchical position plus normalized title (see [`item_key`]), not
/// from the discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub part_num: u32,
    pub part_title: String,
    pub chapter_num: u32,
    pub chapter_title: String,
    /// Chapter prefix as displayed in the catalog (e.g. "Ch01"), when the
    /// discovery collaborator could extract one.
    #[serde(default)]
    pub chapter_prefix: Option<String>,
    pub clip_num: u32,
    pub title: String,
}

impl CatalogItem {
    /// Stable identity key for this item. See [`item_key`].
    pub fn key(&self) -> String {
        item_key(
            self.part_num,
            self.chapter_num,
            self.clip_num,
            &self.title,
        )
    }
}

/// Builds the stable identity key for an item.
///
/// The key is deterministic across runs for an unchanged course structure:
/// structural position (part/chapter/clip numbers) plus the title with
/// surrounding whitespace trimmed and internal whitespace collapsed.
/// Catalog reordering between runs changes positions and therefore keys;
/// that risk is accepted (see DESIGN.md).
pub fn item_key(part_num: u32, chapter_num: u32, clip_num: u32, title: &str) -> String {
    let normalized: String = title.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{}-{}-{}-{}", part_num, chapter_num, clip_num, normalized)
}

/// Sorts items into catalog order: part, then chapter, then clip.
pub fn sort_items(items: &mut [CatalogItem]) {
    items.sort_by(|a, b| {
        (a.part_num, a.chapter_num, a.clip_num).cmp(&(b.part_num, b.chapter_num, b.clip_num))
    });
}
