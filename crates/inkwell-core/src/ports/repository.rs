use async_trait::async_trait;

use crate::domain::{Document, Post, Profile};
use crate::error::RepoError;

/// Storage for documents addressed by a logical key.
///
/// Writes are compare-and-swap on the document version, so a read followed
/// by a write can never silently overwrite someone else's change.
#[async_trait]
pub trait DocumentRepository<T: Document>: Send + Sync {
    /// Find a document by its logical key.
    async fn find_by_key(&self, key: &str) -> Result<Option<T>, RepoError>;

    /// Store a new document under a fresh physical key.
    ///
    /// Fails with `RepoError::Constraint` if the logical key is already taken.
    /// The returned document carries version 1.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite the document with the same logical key, provided its stored
    /// version still equals `expected_version`.
    ///
    /// Fails with `RepoError::NotFound` if there is no such document and with
    /// `RepoError::VersionConflict` if it was written in the meantime.
    async fn replace(&self, entity: T, expected_version: u64) -> Result<T, RepoError>;

    /// Delete the document with the given logical key.
    async fn delete(&self, key: &str) -> Result<(), RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: DocumentRepository<Post> {
    /// All posts owned by `owner_id`, in no particular order.
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, RepoError>;

    /// Every stored post. Search runs over this full scan.
    async fn scan(&self) -> Result<Vec<Post>, RepoError>;
}

/// Profile repository.
#[async_trait]
pub trait ProfileRepository: DocumentRepository<Profile> {
    /// Profiles whose owned, favorite or visited lists mention `post_id`.
    ///
    /// Backed by a reverse index maintained on every profile write.
    async fn find_referencing(&self, post_id: &str) -> Result<Vec<Profile>, RepoError>;
}
