//! Object storage port - where uploaded post images end up.

use async_trait::async_trait;

/// Binary object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under a key derived from `file_name` and return a
    /// publicly resolvable URL for it.
    async fn put(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError>;
}

/// Object storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Storage rejected {key} with status {status}")]
    Rejected { key: String, status: u16 },

    #[error("Connection failed: {0}")]
    Connection(String),
}
