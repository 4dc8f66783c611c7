use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;

use super::{StoreSettings, owned_posts};
use crate::domain::{MembershipList, Post, Profile};
use crate::error::{DomainError, RepoError, require};
use crate::ports::{PostRepository, ProfileRepository};

/// Per-owner profiles and their favorite / visited lists.
#[derive(Clone)]
pub struct ProfileStore {
    profiles: Arc<dyn ProfileRepository>,
    posts: Arc<dyn PostRepository>,
    settings: StoreSettings,
}

impl ProfileStore {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        posts: Arc<dyn PostRepository>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            profiles,
            posts,
            settings,
        }
    }

    /// The stored profile of `owner_id`.
    pub async fn get(&self, owner_id: &str) -> Result<Profile, DomainError> {
        let owner_id = require("ownerId", owner_id)?;
        self.profiles
            .find_by_key(owner_id)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", owner_id))
    }

    /// The profile of `owner_id`, created empty and stored on first access.
    ///
    /// Losing the creation race to another caller re-reads their profile; if
    /// that one is deleted again before the read, creation is retried.
    pub async fn get_or_create(&self, owner_id: &str) -> Result<Profile, DomainError> {
        let owner_id = require("ownerId", owner_id)?;

        for attempt in 0..=self.settings.max_write_retries {
            if let Some(profile) = self.profiles.find_by_key(owner_id).await? {
                return Ok(profile);
            }

            match self.profiles.insert(Profile::new(owner_id.to_string())).await {
                Ok(created) => {
                    tracing::info!(owner_id = %owner_id, "Profile created");
                    return Ok(created);
                }
                Err(RepoError::Constraint(_)) => {
                    tracing::debug!(owner_id = %owner_id, attempt, "Profile created concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict(format!(
            "profile {owner_id} kept appearing and vanishing; gave up after {} attempts",
            self.settings.max_write_retries + 1
        )))
    }

    /// Persist a profile, recomputing its owned post ids.
    ///
    /// Upserts by owner id. When the stored profile changed since `profile`
    /// was read, the membership edits recorded on `profile` are replayed on
    /// top of the stored copy instead of overwriting it.
    pub async fn save(&self, mut profile: Profile) -> Result<Profile, DomainError> {
        let owner_id = require("ownerId", &profile.owner_id)?.to_string();
        let changes = profile.take_pending();

        for attempt in 0..=self.settings.max_write_retries {
            let post_ids = owned_posts(self.posts.as_ref(), &owner_id)
                .await?
                .into_iter()
                .map(|post| post.id)
                .collect();
            profile.set_post_ids(post_ids);
            profile.updated = Utc::now();

            let written = if profile.version == 0 {
                self.profiles.insert(profile.clone()).await
            } else {
                self.profiles.replace(profile.clone(), profile.version).await
            };

            match written {
                Ok(saved) => {
                    tracing::debug!(owner_id = %owner_id, version = saved.version, "Profile saved");
                    return Ok(saved);
                }
                Err(
                    e @ (RepoError::VersionConflict { .. }
                    | RepoError::Constraint(_)
                    | RepoError::NotFound),
                ) => {
                    tracing::warn!(
                        owner_id = %owner_id,
                        attempt,
                        error = %e,
                        "Profile save raced another writer, replaying changes"
                    );
                    profile = self
                        .profiles
                        .find_by_key(&owner_id)
                        .await?
                        .unwrap_or_else(|| Profile::new(owner_id.clone()));
                    profile.replay(&changes);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict(format!(
            "profile {owner_id} kept changing; gave up after {} attempts",
            self.settings.max_write_retries + 1
        )))
    }

    pub async fn delete(&self, owner_id: &str) -> Result<(), DomainError> {
        let owner_id = require("ownerId", owner_id)?;
        self.profiles.delete(owner_id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("profile", owner_id),
            e => e.into(),
        })?;
        tracing::info!(owner_id = %owner_id, "Profile deleted");
        Ok(())
    }

    pub async fn favorite(&self, owner_id: &str, post_id: &str) -> Result<Profile, DomainError> {
        self.edit(owner_id, |profile| profile.add(MembershipList::Favorites, post_id))
            .await
    }

    pub async fn unfavorite(&self, owner_id: &str, post_id: &str) -> Result<Profile, DomainError> {
        self.edit(owner_id, |profile| {
            profile.remove(MembershipList::Favorites, post_id)
        })
        .await
    }

    pub async fn mark_visited(&self, owner_id: &str, post_id: &str) -> Result<Profile, DomainError> {
        self.edit(owner_id, |profile| profile.add(MembershipList::Visited, post_id))
            .await
    }

    pub async fn unmark_visited(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Profile, DomainError> {
        self.edit(owner_id, |profile| profile.remove(MembershipList::Visited, post_id))
            .await
    }

    /// The favorite posts that still exist, in list order.
    pub async fn resolve_favorites(&self, profile: &Profile) -> Result<Vec<Post>, DomainError> {
        self.resolve(profile, MembershipList::Favorites).await
    }

    /// The visited posts that still exist, in list order.
    pub async fn resolve_visited(&self, profile: &Profile) -> Result<Vec<Post>, DomainError> {
        self.resolve(profile, MembershipList::Visited).await
    }

    async fn edit<F>(&self, owner_id: &str, change: F) -> Result<Profile, DomainError>
    where
        F: FnOnce(&mut Profile) -> Result<(), DomainError>,
    {
        let mut profile = self.get_or_create(owner_id).await?;
        change(&mut profile)?;
        self.save(profile).await
    }

    /// Dangling ids (post deleted but not yet reconciled) are skipped.
    async fn resolve(
        &self,
        profile: &Profile,
        list: MembershipList,
    ) -> Result<Vec<Post>, DomainError> {
        let ids = profile.list(list);
        let found = try_join_all(ids.iter().map(|id| self.posts.find_by_key(id))).await?;

        let mut posts = Vec::with_capacity(found.len());
        for (id, post) in ids.iter().zip(found) {
            match post {
                Some(post) => posts.push(post),
                None => tracing::debug!(
                    owner_id = %profile.owner_id,
                    post_id = %id,
                    list = ?list,
                    "Skipping reference to a deleted post"
                ),
            }
        }
        Ok(posts)
    }
}
