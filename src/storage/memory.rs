//! In-process blob store.

use super::{validate_key, BlobStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A stored blob with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Blob store kept in memory. Counts reads and writes for assertions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the object at `bucket/key`.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let objects = self.objects.lock().ok()?;
        objects.get(&(bucket.to_string(), key.to_string())).cloned()
    }

    /// Number of `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `get` calls so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, String), StoredObject>>, StoreError>
    {
        self.objects.lock().map_err(|_| StoreError::Io {
            path: "memory".to_string(),
            source: std::io::Error::other("blob store lock poisoned"),
        })
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        validate_key(key)?;
        self.puts.fetch_add(1, Ordering::SeqCst);

        let object = StoredObject { body, content_type: content_type.to_string() };
        self.lock()?.insert((bucket.to_string(), key.to_string()), object);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        self.lock()?
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.body.clone())
            .ok_or_else(|| StoreError::NotFound { bucket: bucket.to_string(), key: key.to_string() })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryBlobStore::new();
        store.put("landing", "a/b.html", b"<html>".to_vec(), "text/html").await.unwrap();

        assert_eq!(store.get("landing", "a/b.html").await.unwrap(), b"<html>");
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.get_count(), 1);

        let object = store.object("landing", "a/b.html").unwrap();
        assert_eq!(object.content_type, "text/html");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryBlobStore::new();
        let err = store.get("landing", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryBlobStore::new();
        store.put("final", "r.csv", b"one".to_vec(), "text/csv").await.unwrap();
        store.put("final", "r.csv", b"two".to_vec(), "text/csv").await.unwrap();

        assert_eq!(store.get("final", "r.csv").await.unwrap(), b"two");
        assert_eq!(store.list("final", "").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_bucket_and_prefix() {
        let store = MemoryBlobStore::new();
        store.put("landing", "2025-03-10/p1.html", Vec::new(), "text/html").await.unwrap();
        store.put("landing", "2025-03-11/p1.html", Vec::new(), "text/html").await.unwrap();
        store.put("other", "2025-03-10/p2.html", Vec::new(), "text/html").await.unwrap();

        let keys = store.list("landing", "2025-03-10/").await.unwrap();
        assert_eq!(keys, vec!["2025-03-10/p1.html"]);
    }

    #[tokio::test]
    async fn test_put_invalid_key() {
        let store = MemoryBlobStore::new();
        let err = store.put("landing", "../x", Vec::new(), "text/html").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        assert_eq!(store.put_count(), 0);
    }
}
