//! Catalog model: items discovered from a course structure.
//!
//! A catalog is an ordered walk of parts → chapters → clips. Items carry
//! their hierarchical position, which (together with the normalized title)
//! forms their stable identity across discovery runs.

mod naming;
mod source;
mod types;

pub use naming::{chapter_prefix, has_chapter_marker, output_filename, output_path, sanitize_filename};
pub use source::{CatalogError, CatalogSource};
pub use types::{item_key, sort_items, CatalogItem};
