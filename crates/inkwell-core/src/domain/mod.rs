//! Domain entities - the core business objects.

mod post;
mod profile;

pub use post::{ImageUpload, Post, PostFields, PostPatch};
pub use profile::{MembershipChange, MembershipList, Profile};

/// A record stored as a document under a logical key.
///
/// The physical document key is owned by the store and never surfaces here;
/// `version` is bumped by the store on every successful write and is `0`
/// for a document that has not been stored yet.
pub trait Document: Clone + Send + Sync + 'static {
    /// Collection the document lives in (`posts`, `profiles`).
    const COLLECTION: &'static str;

    /// Logical key, unique within the collection.
    fn key(&self) -> &str;

    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);
}
