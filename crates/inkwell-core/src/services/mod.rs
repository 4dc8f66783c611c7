//! Services - the operations callers invoke on posts and profiles.
//!
//! `PostStore` and `ProfileStore` are independent stores with no
//! cross-entity transaction. Deleting a post runs the `Reconciler`, which
//! scrubs the deleted id from every profile that still references it.

mod post_store;
mod profile_store;
mod reconcile;

pub use post_store::PostStore;
pub use profile_store::ProfileStore;
pub use reconcile::{ReconcileFailure, ReconcileReport, Reconciler};

use crate::domain::Post;
use crate::error::RepoError;
use crate::ports::PostRepository;
use crate::search::sort_by_recency;

/// Tunables shared by the services.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// How many times a write that lost a version race is retried.
    pub max_write_retries: u32,
    /// Largest accepted image upload, in bytes.
    pub max_image_bytes: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_write_retries: 5,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Posts owned by `owner_id`, newest first.
pub(crate) async fn owned_posts(
    posts: &dyn PostRepository,
    owner_id: &str,
) -> Result<Vec<Post>, RepoError> {
    let mut owned = posts.find_by_owner(owner_id).await?;
    sort_by_recency(&mut owned);
    Ok(owned)
}
