//! Object storage implementations - HTTP and in-memory fallback.

mod memory;

#[cfg(feature = "http-storage")]
mod http;

pub use memory::InMemoryObjectStorage;

#[cfg(feature = "http-storage")]
pub use http::HttpObjectStorage;

/// Prefix every uploaded post image is stored under.
pub const IMAGE_PREFIX: &str = "post_images";

/// Storage key for an uploaded file: `post_images/<unix-millis>_<name>`.
pub fn object_key(file_name: &str) -> String {
    let name: String = file_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let name = if name.is_empty() { "upload".to_string() } else { name };

    format!(
        "{}/{}_{}",
        IMAGE_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        name
    )
}

/// Join a base URL and a key without doubling the slash.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
