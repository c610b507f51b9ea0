//! Key-value blob storage used for raw pages and reports.

pub mod local;
pub mod memory;

use crate::error::StoreError;
use async_trait::async_trait;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

/// Content type of stored listing pages.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Content type of the consolidated report.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Bucketed blob store with list/get/put.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `body` under `key`, replacing any existing blob.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Reads the blob stored under `key`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Lists keys starting with `prefix`, sorted.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Rejects keys that could escape their bucket.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.ends_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
