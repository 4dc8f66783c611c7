use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Document;

/// Post entity - a single content item owned by exactly one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub version: u64,
}

impl Post {
    /// Create a new, not yet stored post with a freshly minted id.
    pub fn new(
        owner_id: String,
        title: Option<String>,
        content: Option<String>,
        images: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            created: now,
            updated: now,
            title,
            content,
            images,
            version: 0,
        }
    }

    /// Merge the supplied fields and stamp `updated`.
    pub fn apply(&mut self, patch: &PostPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(content) = &patch.content {
            self.content = Some(content.clone());
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
        self.updated = now;
    }
}

impl Document for Post {
    const COLLECTION: &'static str = "posts";

    fn key(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// An image as received from the caller, before it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Editable fields supplied to create or update a post.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct PostFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub images: Vec<ImageUpload>,
}

impl PostFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn image(mut self, image: ImageUpload) -> Self {
        self.images.push(image);
        self
    }

    /// Split into the text part of the patch and the images still to upload.
    pub fn into_parts(self) -> (Option<String>, Option<String>, Vec<ImageUpload>) {
        let title = present(&self.title).map(str::to_owned);
        let content = present(&self.content).map(str::to_owned);
        (title, content, self.images)
    }
}

/// Resolved changes to merge into a stored post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Uploaded image URLs; replaces the stored list when present.
    pub images: Option<Vec<String>>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
