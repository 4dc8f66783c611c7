//! Domain-level error types.

use thiserror::Error;

use crate::ports::StorageError;

/// Domain errors - business logic failures.
///
/// Callers map these to transport outcomes by matching on the variant.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Object storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

/// Repository-level errors.
#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The stored document was written by someone else since it was read.
    #[error("Version conflict: expected version {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
}

/// Reject a missing or blank required argument.
pub(crate) fn require<'a>(name: &str, value: &'a str) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{name} is required")));
    }
    Ok(trimmed)
}
