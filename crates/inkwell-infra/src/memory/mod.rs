//! In-memory document stores - used when no database is configured.
//!
//! Documents are kept as JSON under a store-minted physical key, with a
//! separate index from logical key to physical key, the same shape a
//! document database gives us. Data is lost on process restart.

mod post;
mod profile;

pub use post::InMemoryPostRepository;
pub use profile::InMemoryProfileRepository;

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use inkwell_core::domain::Document;
use inkwell_core::error::RepoError;

struct StoredDocument {
    version: u64,
    body: serde_json::Value,
}

/// One collection of documents of type `T`.
pub(crate) struct Collection<T> {
    docs: HashMap<Uuid, StoredDocument>,
    keys: HashMap<String, Uuid>,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Collection<T>
where
    T: Document + Serialize + DeserializeOwned,
{
    pub(crate) fn new() -> Self {
        Self {
            docs: HashMap::new(),
            keys: HashMap::new(),
            _marker: std::marker::PhantomData,
        }
    }

    pub(crate) fn get(&self, key: &str) -> Result<Option<T>, RepoError> {
        match self.keys.get(key).and_then(|doc_id| self.docs.get(doc_id)) {
            Some(stored) => decode(stored).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn insert(&mut self, mut entity: T) -> Result<T, RepoError> {
        if self.keys.contains_key(entity.key()) {
            return Err(RepoError::Constraint(format!(
                "{} already contains {}",
                T::COLLECTION,
                entity.key()
            )));
        }

        entity.set_version(1);
        let stored = encode(&entity)?;
        let saved = decode(&stored)?;
        let doc_id = Uuid::new_v4();
        self.docs.insert(doc_id, stored);
        self.keys.insert(entity.key().to_string(), doc_id);
        Ok(saved)
    }

    pub(crate) fn replace(&mut self, mut entity: T, expected_version: u64) -> Result<T, RepoError> {
        let doc_id = *self.keys.get(entity.key()).ok_or(RepoError::NotFound)?;
        let stored = self.docs.get(&doc_id).ok_or(RepoError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepoError::VersionConflict {
                expected: expected_version,
                actual: stored.version,
            });
        }

        entity.set_version(expected_version + 1);
        let stored = encode(&entity)?;
        let saved = decode(&stored)?;
        self.docs.insert(doc_id, stored);
        Ok(saved)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Result<T, RepoError> {
        let doc_id = self.keys.remove(key).ok_or(RepoError::NotFound)?;
        let stored = self.docs.remove(&doc_id).ok_or(RepoError::NotFound)?;
        decode(&stored)
    }

    pub(crate) fn all(&self) -> Result<Vec<T>, RepoError> {
        self.docs.values().map(decode).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.docs.len()
    }
}

fn encode<T: Document + Serialize>(entity: &T) -> Result<StoredDocument, RepoError> {
    let body = serde_json::to_value(entity)
        .map_err(|e| RepoError::Query(format!("failed to encode {}: {e}", T::COLLECTION)))?;
    Ok(StoredDocument {
        version: entity.version(),
        body,
    })
}

fn decode<T: Document + DeserializeOwned>(stored: &StoredDocument) -> Result<T, RepoError> {
    let mut entity: T = serde_json::from_value(stored.body.clone())
        .map_err(|e| RepoError::Query(format!("failed to decode {}: {e}", T::COLLECTION)))?;
    entity.set_version(stored.version);
    Ok(entity)
}
