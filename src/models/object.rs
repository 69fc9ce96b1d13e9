//! Represents an object (file) stored in a bucket.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single object row in a bucket listing.
///
/// This is a read-only view over one ListObjectsV2 entry; the content bytes
/// are never fetched while listing.
#[derive(Serialize, Clone, Debug)]
pub struct ObjectEntry {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Last path segment of the key, shown in the listing and used as the
    /// download filename.
    pub filename: String,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Timestamp when the object was last modified.
    pub last_modified: Option<DateTime<Utc>>,

    /// Storage class (e.g. STANDARD, INFREQUENT_ACCESS).
    pub storage_class: String,
}

impl ObjectEntry {
    pub fn from_store(object: &aws_sdk_s3::types::Object) -> Self {
        let key = object.key().unwrap_or_default().to_string();
        let filename = key
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&key)
            .to_string();
        Self {
            filename,
            size_bytes: object.size().unwrap_or(0),
            last_modified: object.last_modified().and_then(super::to_utc),
            storage_class: object
                .storage_class()
                .map(|class| class.as_str().to_string())
                .unwrap_or_else(|| "STANDARD".into()),
            key,
        }
    }
}

/// Metadata accompanying a spooled download body.
#[derive(Clone, Debug)]
pub struct ObjectDownload {
    /// Attachment filename, derived from the last path segment of the key.
    pub filename: String,

    /// Content type as reported by the store.
    pub content_type: Option<String>,

    /// Size in bytes of the spooled body.
    pub size_bytes: i64,
}
