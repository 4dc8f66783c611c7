use async_trait::async_trait;
use tokio::sync::RwLock;

use inkwell_core::domain::Post;
use inkwell_core::error::RepoError;
use inkwell_core::ports::{DocumentRepository, PostRepository};

use super::Collection;

/// In-memory post repository.
pub struct InMemoryPostRepository {
    posts: RwLock<Collection<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Collection::new()),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRepository<Post> for InMemoryPostRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<Post>, RepoError> {
        self.posts.read().await.get(key)
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        self.posts.write().await.insert(entity)
    }

    async fn replace(&self, entity: Post, expected_version: u64) -> Result<Post, RepoError> {
        self.posts.write().await.replace(entity, expected_version)
    }

    async fn delete(&self, key: &str) -> Result<(), RepoError> {
        self.posts.write().await.remove(key).map(|_| ())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await.all()?;
        Ok(posts
            .into_iter()
            .filter(|post| post.owner_id == owner_id)
            .collect())
    }

    async fn scan(&self) -> Result<Vec<Post>, RepoError> {
        self.posts.read().await.all()
    }
}
