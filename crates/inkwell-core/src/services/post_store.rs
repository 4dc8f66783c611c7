use std::sync::Arc;

use chrono::Utc;

use super::{ReconcileReport, Reconciler, StoreSettings, owned_posts};
use crate::domain::{ImageUpload, Post, PostFields, PostPatch};
use crate::error::{DomainError, RepoError, require};
use crate::ports::{ObjectStorage, PostRepository};
use crate::search::{SearchQuery, sort_by_recency};

/// CRUD and keyword search over posts.
#[derive(Clone)]
pub struct PostStore {
    posts: Arc<dyn PostRepository>,
    storage: Arc<dyn ObjectStorage>,
    reconciler: Reconciler,
    settings: StoreSettings,
}

impl PostStore {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        storage: Arc<dyn ObjectStorage>,
        reconciler: Reconciler,
        settings: StoreSettings,
    ) -> Self {
        Self {
            posts,
            storage,
            reconciler,
            settings,
        }
    }

    /// Create a post for `owner_id`, uploading its images first.
    pub async fn create(&self, owner_id: &str, fields: PostFields) -> Result<Post, DomainError> {
        let owner_id = require("ownerId", owner_id)?;
        let (title, content, uploads) = fields.into_parts();
        let images = self.upload_images(accepted_images(uploads)).await?;

        let post = Post::new(owner_id.to_string(), title, content, images);
        let saved = self.posts.insert(post).await?;

        tracing::info!(owner_id = %saved.owner_id, post_id = %saved.id, "Post created");
        Ok(saved)
    }

    /// The post with `id`, if it belongs to `owner_id`.
    pub async fn get_by_id(&self, owner_id: &str, id: &str) -> Result<Post, DomainError> {
        let owner_id = require("ownerId", owner_id)?;
        let id = require("id", id)?;

        match self.posts.find_by_key(id).await? {
            Some(post) if post.owner_id == owner_id => Ok(post),
            _ => {
                tracing::debug!(owner_id = %owner_id, post_id = %id, "Post not found for owner");
                Err(DomainError::not_found("post", id))
            }
        }
    }

    /// Look a post up by id alone, whoever owns it.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Post>, DomainError> {
        let id = require("id", id)?;
        Ok(self.posts.find_by_key(id).await?)
    }

    /// Ids of the posts owned by `owner_id`, newest first.
    pub async fn list_ids_by_owner(&self, owner_id: &str) -> Result<Vec<String>, DomainError> {
        let posts = self.list_by_owner(owner_id).await?;
        Ok(posts.into_iter().map(|post| post.id).collect())
    }

    /// Posts owned by `owner_id`, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, DomainError> {
        let owner_id = require("ownerId", owner_id)?;
        Ok(owned_posts(self.posts.as_ref(), owner_id).await?)
    }

    /// Merge the supplied fields into an existing post.
    ///
    /// The write is an upsert on the logical id: if the document vanished
    /// after it was read it is created again. A write that loses a version
    /// race re-reads the post and re-applies the same patch.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        fields: PostFields,
    ) -> Result<Post, DomainError> {
        let mut post = self.get_by_id(owner_id, id).await?;

        let (title, content, uploads) = fields.into_parts();
        let uploads = accepted_images(uploads);
        if title.is_none() && content.is_none() && uploads.is_empty() {
            return Err(DomainError::validation(
                "at least one of title, content or images is required",
            ));
        }

        let images = self.upload_images(uploads).await?;
        let patch = PostPatch {
            title,
            content,
            images: (!images.is_empty()).then_some(images),
        };

        for attempt in 0..=self.settings.max_write_retries {
            post.apply(&patch, Utc::now());
            let expected = post.version;

            match self.posts.replace(post.clone(), expected).await {
                Ok(saved) => {
                    tracing::info!(owner_id = %saved.owner_id, post_id = %saved.id, "Post updated");
                    return Ok(saved);
                }
                Err(RepoError::NotFound) => {
                    tracing::warn!(post_id = %post.id, "Post vanished during update, recreating");
                    return Ok(self.posts.insert(post).await?);
                }
                Err(RepoError::VersionConflict { expected, actual }) => {
                    tracing::warn!(
                        post_id = %post.id,
                        attempt,
                        expected,
                        actual,
                        "Post update lost a version race, retrying"
                    );
                    if let Some(fresh) = self.posts.find_by_key(&post.id).await? {
                        post = fresh;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict(format!(
            "post {id} kept changing; gave up after {} attempts",
            self.settings.max_write_retries + 1
        )))
    }

    /// Delete a post, then remove it from every profile that references it.
    ///
    /// The reconciliation runs before this returns. Its failures do not fail
    /// the deletion; they are reported in the returned `ReconcileReport`.
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<ReconcileReport, DomainError> {
        let post = self.get_by_id(owner_id, id).await?;

        self.posts.delete(&post.id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("post", &post.id),
            e => e.into(),
        })?;
        tracing::info!(owner_id = %post.owner_id, post_id = %post.id, "Post deleted");

        Ok(self.reconciler.forget_post(&post.id).await)
    }

    /// Posts whose title and/or content contain `keyword`, newest first.
    pub async fn search(
        &self,
        keyword: &str,
        category: Option<&str>,
    ) -> Result<Vec<Post>, DomainError> {
        let query = SearchQuery::parse(keyword, category)?;

        let mut found = query.filter(self.posts.scan().await?);
        sort_by_recency(&mut found);

        tracing::debug!(
            keyword = %query.keyword(),
            category = ?query.category(),
            hits = found.len(),
            "Search finished"
        );
        Ok(found)
    }

    /// Upload images in order and return their URLs.
    async fn upload_images(&self, uploads: Vec<ImageUpload>) -> Result<Vec<String>, DomainError> {
        if let Some(too_big) = uploads
            .iter()
            .find(|upload| upload.bytes.len() > self.settings.max_image_bytes)
        {
            return Err(DomainError::validation(format!(
                "image {} exceeds the {} byte limit",
                too_big.file_name, self.settings.max_image_bytes
            )));
        }

        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let url = self.storage.put(&upload.bytes, &upload.file_name).await?;
            urls.push(url);
        }

        Ok(urls)
    }
}

/// Drop uploads that are not images or carry no bytes.
fn accepted_images(uploads: Vec<ImageUpload>) -> Vec<ImageUpload> {
    uploads
        .into_iter()
        .filter(|upload| {
            if !upload.is_image() {
                tracing::warn!(
                    file_name = %upload.file_name,
                    content_type = %upload.content_type,
                    "Skipping upload that is not an image"
                );
                return false;
            }
            if upload.bytes.is_empty() {
                tracing::warn!(file_name = %upload.file_name, "Skipping empty image upload");
                return false;
            }
            true
        })
        .collect()
}
