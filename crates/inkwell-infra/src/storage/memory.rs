//! In-memory object storage - used when no upload endpoint is configured.
//!
//! Note: Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use inkwell_core::ports::{ObjectStorage, StorageError};

use super::{join_url, object_key};

/// Keeps uploaded objects in a HashMap and hands out URLs under `public_base_url`.
pub struct InMemoryObjectStorage {
    public_base_url: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStorage {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Bytes stored under `url`, if it was issued by this store.
    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        let key = url
            .strip_prefix(self.public_base_url.trim_end_matches('/'))?
            .trim_start_matches('/');
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for InMemoryObjectStorage {
    fn default() -> Self {
        Self::new("memory://inkwell")
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError> {
        let mut key = object_key(file_name);

        let mut objects = self.objects.write().await;
        // Same name within the same millisecond.
        let mut n = 1;
        while objects.contains_key(&key) {
            key = format!("{}-{n}", object_key(file_name));
            n += 1;
        }
        objects.insert(key.clone(), bytes.to_vec());

        tracing::debug!(key = %key, size = bytes.len(), "Object stored");
        Ok(join_url(&self.public_base_url, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let storage = InMemoryObjectStorage::new("https://cdn.test");
        let url = storage.put(b"png-bytes", "cat.png").await.unwrap();

        assert!(url.starts_with("https://cdn.test/post_images/"));
        assert!(url.ends_with("_cat.png"));
        assert_eq!(storage.get(&url).await, Some(b"png-bytes".to_vec()));
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_urls() {
        let storage = InMemoryObjectStorage::default();
        let first = storage.put(b"1", "a.png").await.unwrap();
        let second = storage.put(b"2", "a.png").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(storage.len().await, 2);
    }
}
