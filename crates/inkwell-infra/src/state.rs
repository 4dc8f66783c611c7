//! Service wiring - picks backends from configuration.

use std::sync::Arc;

use inkwell_core::ports::{ObjectStorage, PostRepository, ProfileRepository};
use inkwell_core::{PostStore, ProfileStore, Reconciler, StoreSettings};

use crate::config::{InfraConfig, StorageConfig};
use crate::memory::{InMemoryPostRepository, InMemoryProfileRepository};
use crate::storage::InMemoryObjectStorage;

#[cfg(feature = "postgres")]
use crate::database::{PostgresPostRepository, PostgresProfileRepository, connect};

#[cfg(feature = "http-storage")]
use crate::storage::HttpObjectStorage;

/// The post and profile stores, sharing one set of backends.
#[derive(Clone)]
pub struct ContentServices {
    pub posts: PostStore,
    pub profiles: ProfileStore,
}

impl ContentServices {
    /// Wire the services over explicit backends.
    pub fn with_backends(
        post_repo: Arc<dyn PostRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        storage: Arc<dyn ObjectStorage>,
        settings: StoreSettings,
    ) -> Self {
        let reconciler = Reconciler::new(profile_repo.clone(), settings.max_write_retries);
        Self {
            posts: PostStore::new(post_repo.clone(), storage, reconciler, settings.clone()),
            profiles: ProfileStore::new(profile_repo, post_repo, settings),
        }
    }

    /// Everything in memory. Data is lost on process restart.
    pub fn in_memory(settings: StoreSettings) -> Self {
        Self::with_backends(
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(InMemoryObjectStorage::default()),
            settings,
        )
    }

    /// Build the services with the backends `config` asks for.
    ///
    /// Falls back to the in-memory stores when the database is not
    /// configured or cannot be reached.
    pub async fn from_config(config: &InfraConfig) -> Self {
        let storage = object_storage(&config.storage);

        #[cfg(feature = "postgres")]
        let (post_repo, profile_repo): (Arc<dyn PostRepository>, Arc<dyn ProfileRepository>) = {
            if let Some(db_config) = &config.database {
                match connect(db_config).await {
                    Ok(conn) => (
                        Arc::new(PostgresPostRepository::new(conn.clone())),
                        Arc::new(PostgresProfileRepository::new(conn)),
                    ),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        in_memory_repos()
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory_repos()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (post_repo, profile_repo) = {
            if config.database.is_some() {
                tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
            }
            in_memory_repos()
        };

        tracing::info!("Content services initialized");

        Self::with_backends(post_repo, profile_repo, storage, config.store.clone())
    }
}

fn in_memory_repos() -> (Arc<dyn PostRepository>, Arc<dyn ProfileRepository>) {
    (
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryProfileRepository::new()),
    )
}

fn object_storage(config: &StorageConfig) -> Arc<dyn ObjectStorage> {
    match &config.upload_url {
        #[cfg(feature = "http-storage")]
        Some(upload_url) => {
            tracing::info!(upload_url = %upload_url, "Using HTTP object storage");
            Arc::new(HttpObjectStorage::new(
                upload_url.clone(),
                config.public_base_url.clone(),
            ))
        }
        #[cfg(not(feature = "http-storage"))]
        Some(_) => {
            tracing::warn!("Built without http-storage feature - keeping uploads in memory");
            Arc::new(InMemoryObjectStorage::new(config.public_base_url.clone()))
        }
        None => Arc::new(InMemoryObjectStorage::new(config.public_base_url.clone())),
    }
}
