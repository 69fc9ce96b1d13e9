//! Represents a bucket — a top-level container for objects.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A bucket as reported by the store's ListBuckets call.
///
/// Buckets act as namespaces for objects. The gateway never caches them;
/// the list is fetched fresh on every request to the index page.
#[derive(Serialize, Clone, Debug)]
pub struct Bucket {
    /// Globally unique bucket name (conforms to DNS naming rules).
    pub name: String,

    /// When this bucket was created, if the store reported it.
    pub created_at: Option<DateTime<Utc>>,
}

impl Bucket {
    pub fn from_store(bucket: &aws_sdk_s3::types::Bucket) -> Self {
        Self {
            name: bucket.name().unwrap_or_default().to_string(),
            created_at: bucket.creation_date().and_then(super::to_utc),
        }
    }
}
