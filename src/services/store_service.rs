//! src/services/store_service.rs
//!
//! StoreService — one S3 API call per gateway operation, issued through a
//! shared `aws_sdk_s3::Client`. The service holds no state beyond the client
//! handle and the spool directory downloads are staged through; every request
//! is a single call-and-translate cycle against the upstream store.

use crate::config::AppConfig;
use crate::models::{
    bucket::Bucket,
    listing::{Folder, ListingPage},
    object::{ObjectDownload, ObjectEntry},
};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::{io, path::PathBuf};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Parameters forwarded verbatim to ListObjectsV2.
#[derive(Clone, Debug)]
pub struct ListObjectsParams {
    /// Key prefix to list under; empty means the bucket root.
    pub prefix: String,
    /// Grouping delimiter; empty disables folder grouping.
    pub delimiter: String,
    /// Opaque cursor from a previous page, still base64-wrapped.
    pub continuation_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),
    #[error("bucket name `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error("object store unreachable: {0}")]
    Unreachable(String),
    #[error("object store error: {0}")]
    Service(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const MAX_KEYS: i32 = 1000;
const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// Build the S3 client from application configuration.
///
/// Path-style addressing is required by LocalStack-style emulators, and SDK
/// retries are disabled: a failed store call surfaces immediately as an
/// error page rather than being silently retried.
pub fn build_client(cfg: &AppConfig) -> Client {
    let credentials = Credentials::new(
        cfg.access_key.clone(),
        cfg.secret_key.clone(),
        None,
        None,
        "bucket-browser",
    );
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(cfg.region.clone()))
        .endpoint_url(cfg.endpoint.clone())
        .credentials_provider(credentials)
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .build();
    Client::from_conf(config)
}

/// StoreService provides the gateway's four store operations:
/// - List buckets
/// - List one page of objects under a prefix
/// - Download an object (spooled through a temporary file)
/// - Create a bucket
///
/// The struct is cheap to clone; the client handle is internally shared and
/// read-only, so handlers never coordinate with each other.
#[derive(Clone)]
pub struct StoreService {
    client: Client,

    /// Directory download bodies are staged in before streaming out.
    pub spool_dir: PathBuf,
}

impl StoreService {
    pub fn new(client: Client, spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            spool_dir: spool_dir.into(),
        }
    }

    /// List every bucket in the store. Object stores return the full set in
    /// one call, so there is no pagination here.
    pub async fn list_buckets(&self) -> StoreResult<Vec<Bucket>> {
        let response = self.client.list_buckets().send().await.map_err(classify)?;
        Ok(response.buckets().iter().map(Bucket::from_store).collect())
    }

    /// Fetch one page of a bucket listing.
    ///
    /// Issues a single ListObjectsV2 call with `max_keys=1000`, splits the
    /// response into folder prefixes and leaf objects, and wraps the next
    /// continuation token so it survives the URL round-trip. The caller
    /// drives pagination; nothing is cached between pages.
    pub async fn list_objects(
        &self,
        bucket: &str,
        params: ListObjectsParams,
    ) -> StoreResult<ListingPage> {
        ensure_bucket_name_safe(bucket)?;
        let ListObjectsParams {
            prefix,
            delimiter,
            continuation_token,
        } = params;

        let token = continuation_token
            .as_deref()
            .map(decode_continuation_token);
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(MAX_KEYS)
            .set_prefix((!prefix.is_empty()).then(|| prefix.clone()))
            .set_delimiter((!delimiter.is_empty()).then(|| delimiter.clone()))
            .set_continuation_token(token)
            .send()
            .await
            .map_err(classify)?;

        let folders = response
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix())
            .map(|full| Folder::new(full, &prefix, &delimiter))
            .collect();
        // Skip the zero-byte marker some clients write for the folder itself.
        let objects = response
            .contents()
            .iter()
            .filter(|obj| obj.key().is_some_and(|key| key != prefix))
            .map(ObjectEntry::from_store)
            .collect();
        let next_token = response
            .next_continuation_token()
            .map(encode_continuation_token);
        let parent_prefix = parent_prefix(&prefix, &delimiter);

        Ok(ListingPage {
            bucket: bucket.to_string(),
            prefix,
            delimiter,
            folders,
            objects,
            parent_prefix,
            next_token,
        })
    }

    /// Fetch an object and stage it for streaming.
    ///
    /// The whole body is collected into memory, written to a uniquely named
    /// spool file, and reopened for reading. The spool path is unlinked as
    /// soon as the read handle is open: the kernel reclaims the bytes when
    /// the response stream drops, whether the download completed or not.
    pub async fn download_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<(ObjectDownload, File)> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;
        let content_type = response.content_type().map(str::to_string);
        let data: Bytes = response
            .body
            .collect()
            .await
            .map_err(|err| StoreError::Service(format!("reading object body: {}", err)))?
            .into_bytes();

        fs::create_dir_all(&self.spool_dir).await?;
        let spool_path = self.spool_dir.join(format!(".dl-{}", Uuid::new_v4()));
        let mut file = File::create(&spool_path).await?;
        if let Err(err) = file.write_all(&data).await {
            let _ = fs::remove_file(&spool_path).await;
            return Err(StoreError::Io(err));
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&spool_path).await;
            return Err(StoreError::Io(err));
        }
        drop(file);

        let reader = File::open(&spool_path).await?;
        fs::remove_file(&spool_path).await?;
        debug!("spooled {} bytes for {}/{}", data.len(), bucket, key);

        let download = ObjectDownload {
            filename: filename_of(key).to_string(),
            content_type,
            size_bytes: data.len() as i64,
        };
        Ok((download, reader))
    }

    /// Create a bucket in the configured region.
    ///
    /// The name is validated locally first so obviously malformed input never
    /// reaches the store. No CreateBucketConfiguration is sent; the default
    /// region needs none.
    pub async fn create_bucket(&self, name: &str) -> StoreResult<()> {
        ensure_bucket_name_safe(name)?;
        self.client
            .create_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Map an SDK failure onto the gateway's error taxonomy.
///
/// Transport failures (the emulator is down, a timeout fired) become
/// `Unreachable`; recognized service codes become their tagged variant;
/// everything else is a generic store error carrying the upstream message.
fn classify<E>(err: SdkError<E>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    ) {
        return StoreError::Unreachable(DisplayErrorContext(&err).to_string());
    }
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    match err.code() {
        Some("NoSuchBucket") | Some("NoSuchKey") => StoreError::NotFound(message),
        Some("AccessDenied") => StoreError::AccessDenied(message),
        Some("BucketAlreadyExists") | Some("BucketAlreadyOwnedByYou") => {
            StoreError::BucketAlreadyExists(message)
        }
        _ => StoreError::Service(message),
    }
}

/// Basic key validation to avoid trivial path traversal vectors.
///
/// Rejects empty or oversized keys, keys that begin with `/` or contain
/// `..`, and keys carrying control bytes.
fn ensure_key_safe(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(StoreError::InvalidObjectKey);
    }
    if key.starts_with('/') || key.contains("..") {
        return Err(StoreError::InvalidObjectKey);
    }
    if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
        return Err(StoreError::InvalidObjectKey);
    }
    Ok(())
}

/// Validate bucket name format against S3 naming rules:
/// 3–63 characters, lowercase letters, digits, dots, and hyphens, starting
/// and ending with a letter or digit, no `..`/`.-`/`-.` runs, and not shaped
/// like an IPv4 address.
fn ensure_bucket_name_safe(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidBucketName {
        name: name.to_string(),
        reason: reason.into(),
    };

    if name.len() < BUCKET_NAME_MIN_LEN || name.len() > BUCKET_NAME_MAX_LEN {
        return Err(invalid("must be between 3 and 63 characters"));
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return Err(invalid(
            "allowed characters are lowercase letters, digits, dots, and hyphens",
        ));
    }
    let first = name.chars().next().unwrap_or(' ');
    let last = name.chars().last().unwrap_or(' ');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(invalid("must start and end with a lowercase letter or digit"));
    }
    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return Err(invalid(
            "cannot contain consecutive dots or dot-hyphen combinations",
        ));
    }
    if is_ipv4_like(name) {
        return Err(invalid("must not be formatted like an IP address"));
    }
    Ok(())
}

/// Compute the parent prefix for listing navigation.
///
/// Strips the last delimiter-separated segment: the parent of `a/b/` is
/// `a/`, and the parent of a single-segment prefix is the bucket root
/// (empty string). Returns None at the root itself or when grouping is
/// disabled.
pub fn parent_prefix(prefix: &str, delimiter: &str) -> Option<String> {
    if prefix.is_empty() || delimiter.is_empty() {
        return None;
    }
    let trimmed = prefix.strip_suffix(delimiter).unwrap_or(prefix);
    match trimmed.rfind(delimiter) {
        Some(pos) => Some(trimmed[..pos + delimiter.len()].to_string()),
        None => Some(String::new()),
    }
}

/// Last path segment of a key, used as the download filename.
fn filename_of(key: &str) -> &str {
    key.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(key)
}

/// Wrap a store continuation token so it survives a URL round-trip.
fn encode_continuation_token(token: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(token)
}

/// Unwrap a token coming back in as a query parameter. Falls back to the raw
/// value so a hand-crafted plain token still reaches the store.
fn decode_continuation_token(token: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| token.to_string())
}

/// Check if a string matches IPv4-like dotted decimal form.
/// Rejects names formatted like `1.2.3.4`.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|segment| {
        !segment.is_empty()
            && segment.len() <= 3
            && segment.chars().all(|c| c.is_ascii_digit())
            && segment.parse::<u8>().is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_prefix_strips_last_segment() {
        assert_eq!(parent_prefix("photos/2025/", "/"), Some("photos/".into()));
        assert_eq!(parent_prefix("a/b/c/", "/"), Some("a/b/".into()));
        // no trailing delimiter behaves the same
        assert_eq!(parent_prefix("photos/2025", "/"), Some("photos/".into()));
    }

    #[test]
    fn parent_of_top_level_folder_is_bucket_root() {
        assert_eq!(parent_prefix("photos/", "/"), Some(String::new()));
        assert_eq!(parent_prefix("photos", "/"), Some(String::new()));
    }

    #[test]
    fn parent_prefix_none_at_root_or_without_delimiter() {
        assert_eq!(parent_prefix("", "/"), None);
        assert_eq!(parent_prefix("photos/2025/", ""), None);
    }

    #[test]
    fn continuation_token_survives_round_trip() {
        let token = "1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=";
        let wrapped = encode_continuation_token(token);
        assert_ne!(wrapped, token);
        assert_eq!(decode_continuation_token(&wrapped), token);
    }

    #[test]
    fn raw_token_passes_through_decode() {
        // '%' can never appear in base64, so this falls back to the raw value
        assert_eq!(decode_continuation_token("not%wrapped"), "not%wrapped");
    }

    #[test]
    fn bucket_names_validate() {
        assert!(ensure_bucket_name_safe("my-bucket.01").is_ok());
        assert!(ensure_bucket_name_safe("abc").is_ok());

        assert!(ensure_bucket_name_safe("ab").is_err());
        assert!(ensure_bucket_name_safe(&"a".repeat(64)).is_err());
        assert!(ensure_bucket_name_safe("MyBucket").is_err());
        assert!(ensure_bucket_name_safe("-bucket").is_err());
        assert!(ensure_bucket_name_safe("bucket-").is_err());
        assert!(ensure_bucket_name_safe("bu..cket").is_err());
        assert!(ensure_bucket_name_safe("bu.-cket").is_err());
        assert!(ensure_bucket_name_safe("192.168.0.1").is_err());
    }

    #[test]
    fn ipv4_detection() {
        assert!(is_ipv4_like("10.0.0.1"));
        assert!(!is_ipv4_like("256.0.0.1"));
        assert!(!is_ipv4_like("1.2.3"));
        assert!(!is_ipv4_like("a.b.c.d"));
    }

    #[test]
    fn object_keys_validate() {
        assert!(ensure_key_safe("photos/2025/img.jpg").is_ok());
        assert!(ensure_key_safe("").is_err());
        assert!(ensure_key_safe("/leading").is_err());
        assert!(ensure_key_safe("a/../b").is_err());
        assert!(ensure_key_safe("tab\there").is_err());
        assert!(ensure_key_safe(&"k".repeat(1025)).is_err());
    }

    #[test]
    fn filename_is_last_path_segment() {
        assert_eq!(filename_of("dir/file.txt"), "file.txt");
        assert_eq!(filename_of("file.txt"), "file.txt");
        assert_eq!(filename_of("a/b/c.tar.gz"), "c.tar.gz");
        assert_eq!(filename_of("dir/"), "dir");
    }
}
