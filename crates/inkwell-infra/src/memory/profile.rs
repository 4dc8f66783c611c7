use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use inkwell_core::domain::Profile;
use inkwell_core::error::RepoError;
use inkwell_core::ports::{DocumentRepository, ProfileRepository};

use super::Collection;

struct ProfileTables {
    profiles: Collection<Profile>,
    /// post id -> owners whose profile mentions it.
    refs: HashMap<String, BTreeSet<String>>,
}

impl ProfileTables {
    fn index(&mut self, profile: &Profile) {
        for post_id in profile.referenced_post_ids() {
            self.refs
                .entry(post_id.to_string())
                .or_default()
                .insert(profile.owner_id.clone());
        }
    }

    fn unindex(&mut self, profile: &Profile) {
        for post_id in profile.referenced_post_ids() {
            if let Some(owners) = self.refs.get_mut(post_id) {
                owners.remove(&profile.owner_id);
                if owners.is_empty() {
                    self.refs.remove(post_id);
                }
            }
        }
    }
}

/// In-memory profile repository with a reverse post-id index.
pub struct InMemoryProfileRepository {
    tables: RwLock<ProfileTables>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(ProfileTables {
                profiles: Collection::new(),
                refs: HashMap::new(),
            }),
        }
    }
}

impl Default for InMemoryProfileRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRepository<Profile> for InMemoryProfileRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<Profile>, RepoError> {
        self.tables.read().await.profiles.get(key)
    }

    async fn insert(&self, entity: Profile) -> Result<Profile, RepoError> {
        let mut tables = self.tables.write().await;
        let saved = tables.profiles.insert(entity)?;
        tables.index(&saved);
        Ok(saved)
    }

    async fn replace(&self, entity: Profile, expected_version: u64) -> Result<Profile, RepoError> {
        let mut tables = self.tables.write().await;
        let previous = tables.profiles.get(&entity.owner_id)?;
        let saved = tables.profiles.replace(entity, expected_version)?;
        if let Some(previous) = previous {
            tables.unindex(&previous);
        }
        tables.index(&saved);
        Ok(saved)
    }

    async fn delete(&self, key: &str) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let removed = tables.profiles.remove(key)?;
        tables.unindex(&removed);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_referencing(&self, post_id: &str) -> Result<Vec<Profile>, RepoError> {
        let tables = self.tables.read().await;
        let Some(owners) = tables.refs.get(post_id) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::with_capacity(owners.len());
        for owner_id in owners {
            if let Some(profile) = tables.profiles.get(owner_id)? {
                found.push(profile);
            }
        }
        Ok(found)
    }
}
