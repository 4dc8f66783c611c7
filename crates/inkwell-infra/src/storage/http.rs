//! Object storage over plain HTTP PUT.
//!
//! Works with any bucket that accepts `PUT <upload_url>/<key>` and serves
//! the object back at `<public_base_url>/<key>`.

use async_trait::async_trait;

use inkwell_core::ports::{ObjectStorage, StorageError};

use super::{join_url, object_key};

/// HTTP object storage client.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    upload_url: String,
    public_base_url: String,
}

impl HttpObjectStorage {
    pub fn new(upload_url: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: upload_url.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError> {
        let key = object_key(file_name);

        let response = self
            .client
            .put(join_url(&self.upload_url, &key))
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    StorageError::Connection(e.to_string())
                } else {
                    StorageError::Upload(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(key = %key, status = status.as_u16(), "Object upload rejected");
            return Err(StorageError::Rejected {
                key,
                status: status.as_u16(),
            });
        }

        tracing::debug!(key = %key, size = bytes.len(), "Object uploaded");
        Ok(join_url(&self.public_base_url, &key))
    }
}
