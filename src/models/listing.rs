//! One rendered page of a bucket listing.

use super::object::ObjectEntry;
use serde::Serialize;

/// A synthetic folder, grouped by the store from keys sharing a prefix.
#[derive(Serialize, Clone, Debug)]
pub struct Folder {
    /// Full common prefix, delimiter included (`photos/2025/`).
    pub prefix: String,

    /// Display name relative to the listing's prefix (`2025`).
    pub name: String,
}

impl Folder {
    pub fn new(full: &str, parent: &str, delimiter: &str) -> Self {
        let relative = full.strip_prefix(parent).unwrap_or(full);
        let name = if delimiter.is_empty() {
            relative
        } else {
            relative.strip_suffix(delimiter).unwrap_or(relative)
        };
        Self {
            prefix: full.to_string(),
            name: name.to_string(),
        }
    }
}

/// Everything the bucket template needs for one page: folders, objects, the
/// parent prefix for upward navigation, and the wrapped continuation token
/// for the next page. Constructed per request, never persisted.
#[derive(Serialize, Clone, Debug)]
pub struct ListingPage {
    pub bucket: String,
    pub prefix: String,
    pub delimiter: String,
    pub folders: Vec<Folder>,
    pub objects: Vec<ObjectEntry>,
    /// None at the bucket root; `Some("")` links back to the root.
    pub parent_prefix: Option<String>,
    pub next_token: Option<String>,
}
