//! SeaORM entities for the document tables.

pub mod post;
pub mod profile;
pub mod profile_ref;

use inkwell_core::error::RepoError;

/// Decode a JSON array column into a list of ids.
pub(crate) fn decode_ids(
    column: &'static str,
    value: serde_json::Value,
) -> Result<Vec<String>, RepoError> {
    serde_json::from_value(value)
        .map_err(|e| RepoError::Query(format!("malformed {column} column: {e}")))
}

pub(crate) fn encode_ids(ids: &[String]) -> serde_json::Value {
    serde_json::Value::from(ids.to_vec())
}
