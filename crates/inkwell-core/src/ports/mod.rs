//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod repository;
mod storage;

pub use repository::{DocumentRepository, PostRepository, ProfileRepository};
pub use storage::{ObjectStorage, StorageError};
