//! Output path and filename construction.
//!
//! Layout: `<root>/<sanitized part title>/PART<n>-<chapter prefix>-<sanitized
//! title>.mp4`. The chapter segment is omitted when the clip title itself
//! already starts with a chapter marker (`CH01`, `Ch1`, `C3`, ...).

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::CatalogItem;

const MAX_FILENAME_CHARS: usize = 100;

static CHAPTER_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^CH?\d+").unwrap());

static CHAPTER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(CH\s*\d+)").unwrap());

/// Replaces filesystem-illegal characters with `_`, collapses whitespace,
/// trims, and truncates to 100 characters.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_FILENAME_CHARS).collect()
}

/// Whether a clip title already carries its own chapter marker.
pub fn has_chapter_marker(title: &str) -> bool {
    CHAPTER_MARKER.is_match(title.trim())
}

/// Chapter prefix for the filename: the prefix captured during discovery,
/// else one extracted from the chapter title, else `Ch<chapterNum>`.
pub fn chapter_prefix(item: &CatalogItem) -> String {
    if let Some(prefix) = &item.chapter_prefix {
        if !prefix.is_empty() {
            return prefix.clone();
        }
    }
    if let Some(caps) = CHAPTER_PREFIX.captures(item.chapter_title.trim()) {
        if let Some(m) = caps.get(1) {
            return m.as_str().split_whitespace().collect();
        }
    }
    format!("Ch{}", item.chapter_num)
}

/// Output filename for an item, without the part directory.
pub fn output_filename(item: &CatalogItem) -> String {
    let title_part = sanitize_filename(&item.title);
    if has_chapter_marker(&item.title) {
        format!("PART{}-{}.mp4", item.part_num, title_part)
    } else {
        format!(
            "PART{}-{}-{}.mp4",
            item.part_num,
            chapter_prefix(item),
            title_part
        )
    }
}

/// Full destination path: `<root>/<sanitized part title>/<filename>`.
pub fn output_path(root: &Path, item: &CatalogItem) -> PathBuf {
    root.join(sanitize_filename(&item.part_title))
        .join(output_filename(item))
}
