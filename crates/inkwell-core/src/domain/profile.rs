use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::Document;
use crate::error::{DomainError, require};

/// The two lists an owner curates on their profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipList {
    Favorites,
    Visited,
}

impl MembershipList {
    fn label(self) -> &'static str {
        match self {
            MembershipList::Favorites => "favorite",
            MembershipList::Visited => "visited",
        }
    }
}

/// A membership edit made in memory and not yet persisted.
///
/// Replayed on top of the stored profile when a save loses a version race,
/// so concurrent edits behave as set-union / set-remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipChange {
    Add(MembershipList, String),
    Remove(MembershipList, String),
}

/// Profile entity - the per-owner aggregate of owned, favorite and visited post ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub owner_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    post_ids: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    favorite_post_ids: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    visited_post_ids: Vec<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(skip)]
    pending: Vec<MembershipChange>,
}

impl Profile {
    /// Create an empty, not yet stored profile.
    pub fn new(owner_id: String) -> Self {
        let now = Utc::now();
        Self {
            owner_id,
            created: now,
            updated: now,
            post_ids: Vec::new(),
            favorite_post_ids: Vec::new(),
            visited_post_ids: Vec::new(),
            version: 0,
            pending: Vec::new(),
        }
    }

    /// Rebuild a profile from its stored fields. Duplicate ids are dropped.
    pub fn restore(
        owner_id: String,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        post_ids: Vec<String>,
        favorite_post_ids: Vec<String>,
        visited_post_ids: Vec<String>,
        version: u64,
    ) -> Self {
        Self {
            owner_id,
            created,
            updated,
            post_ids: dedup(post_ids),
            favorite_post_ids: dedup(favorite_post_ids),
            visited_post_ids: dedup(visited_post_ids),
            version,
            pending: Vec::new(),
        }
    }

    pub fn post_ids(&self) -> &[String] {
        &self.post_ids
    }

    pub fn favorite_post_ids(&self) -> &[String] {
        &self.favorite_post_ids
    }

    pub fn visited_post_ids(&self) -> &[String] {
        &self.visited_post_ids
    }

    pub fn list(&self, list: MembershipList) -> &[String] {
        match list {
            MembershipList::Favorites => &self.favorite_post_ids,
            MembershipList::Visited => &self.visited_post_ids,
        }
    }

    /// Replace the derived list of owned posts.
    pub fn set_post_ids(&mut self, post_ids: Vec<String>) {
        self.post_ids = dedup(post_ids);
    }

    pub fn add_favorite(&mut self, post_id: &str) -> Result<(), DomainError> {
        self.add(MembershipList::Favorites, post_id)
    }

    pub fn remove_favorite(&mut self, post_id: &str) -> Result<(), DomainError> {
        self.remove(MembershipList::Favorites, post_id)
    }

    pub fn add_visited(&mut self, post_id: &str) -> Result<(), DomainError> {
        self.add(MembershipList::Visited, post_id)
    }

    pub fn remove_visited(&mut self, post_id: &str) -> Result<(), DomainError> {
        self.remove(MembershipList::Visited, post_id)
    }

    /// Add `post_id` to a list; it must not be there already.
    pub fn add(&mut self, list: MembershipList, post_id: &str) -> Result<(), DomainError> {
        let post_id = require("postId", post_id)?;
        if self.list(list).iter().any(|id| id == post_id) {
            return Err(DomainError::conflict(format!(
                "post {post_id} is already in the {} list",
                list.label()
            )));
        }
        self.list_mut(list).push(post_id.to_string());
        self.pending
            .push(MembershipChange::Add(list, post_id.to_string()));
        Ok(())
    }

    /// Remove `post_id` from a list; it must be there.
    pub fn remove(&mut self, list: MembershipList, post_id: &str) -> Result<(), DomainError> {
        let post_id = require("postId", post_id)?;
        if !self.list(list).iter().any(|id| id == post_id) {
            return Err(DomainError::conflict(format!(
                "post {post_id} is not in the {} list",
                list.label()
            )));
        }
        self.list_mut(list).retain(|id| id != post_id);
        self.pending
            .push(MembershipChange::Remove(list, post_id.to_string()));
        Ok(())
    }

    /// Membership edits made since the profile was loaded.
    pub fn pending_changes(&self) -> &[MembershipChange] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<MembershipChange> {
        std::mem::take(&mut self.pending)
    }

    /// Apply changes idempotently, without recording them as pending.
    pub fn replay(&mut self, changes: &[MembershipChange]) {
        for change in changes {
            match change {
                MembershipChange::Add(list, id) => {
                    let ids = self.list_mut(*list);
                    if !ids.contains(id) {
                        ids.push(id.clone());
                    }
                }
                MembershipChange::Remove(list, id) => {
                    self.list_mut(*list).retain(|existing| existing != id);
                }
            }
        }
    }

    /// Drop `post_id` from every list. Returns whether anything changed.
    pub fn forget_post(&mut self, post_id: &str) -> bool {
        let before =
            self.post_ids.len() + self.favorite_post_ids.len() + self.visited_post_ids.len();
        self.post_ids.retain(|id| id != post_id);
        self.favorite_post_ids.retain(|id| id != post_id);
        self.visited_post_ids.retain(|id| id != post_id);
        let after =
            self.post_ids.len() + self.favorite_post_ids.len() + self.visited_post_ids.len();
        before != after
    }

    /// Every post id this profile points at, across all three lists.
    pub fn referenced_post_ids(&self) -> BTreeSet<&str> {
        self.post_ids
            .iter()
            .chain(&self.favorite_post_ids)
            .chain(&self.visited_post_ids)
            .map(String::as_str)
            .collect()
    }

    fn list_mut(&mut self, list: MembershipList) -> &mut Vec<String> {
        match list {
            MembershipList::Favorites => &mut self.favorite_post_ids,
            MembershipList::Visited => &mut self.visited_post_ids,
        }
    }
}

impl Document for Profile {
    const COLLECTION: &'static str = "profiles";

    fn key(&self) -> &str {
        &self.owner_id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Stored lists are sets; duplicates in a loaded document are dropped.
fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer).map(dedup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::new("u1".to_string())
    }

    #[test]
    fn test_add_favorite_twice_conflicts() {
        let mut profile = profile();
        profile.add_favorite("p1").unwrap();

        let err = profile.add_favorite("p1").unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(profile.favorite_post_ids(), ["p1".to_string()]);
    }

    #[test]
    fn test_remove_from_empty_list_conflicts() {
        let mut profile = profile();
        assert!(matches!(
            profile.remove_favorite("p1"),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            profile.remove_visited("p1"),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn test_blank_post_id_is_rejected() {
        let mut profile = profile();
        assert!(matches!(
            profile.add_visited(""),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            profile.remove_visited("  "),
            Err(DomainError::Validation(_))
        ));
        assert!(profile.pending_changes().is_empty());
    }

    #[test]
    fn test_lists_are_independent() {
        let mut profile = profile();
        profile.add_favorite("p1").unwrap();
        profile.add_visited("p1").unwrap();
        profile.remove_favorite("p1").unwrap();

        assert!(profile.favorite_post_ids().is_empty());
        assert_eq!(profile.visited_post_ids(), ["p1".to_string()]);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let mut ours = profile();
        ours.add_favorite("p1").unwrap();
        ours.add_visited("p2").unwrap();
        ours.remove_visited("p2").unwrap();
        let changes = ours.take_pending();
        assert_eq!(changes.len(), 3);

        let mut stored = Profile::restore(
            "u1".into(),
            Utc::now(),
            Utc::now(),
            vec![],
            vec!["p0".into(), "p1".into()],
            vec!["p2".into()],
            4,
        );
        stored.replay(&changes);
        stored.replay(&changes);

        assert_eq!(stored.favorite_post_ids(), ["p0".to_string(), "p1".to_string()]);
        assert!(stored.visited_post_ids().is_empty());
        assert!(stored.pending_changes().is_empty());
        assert_eq!(stored.version, 4);
    }

    #[test]
    fn test_forget_post_scrubs_all_lists() {
        let mut profile = Profile::restore(
            "u1".into(),
            Utc::now(),
            Utc::now(),
            vec!["p1".into(), "p2".into()],
            vec!["p1".into()],
            vec!["p3".into(), "p1".into()],
            1,
        );

        assert!(profile.forget_post("p1"));
        assert!(!profile.forget_post("p1"));
        assert_eq!(profile.post_ids(), ["p2".to_string()]);
        assert!(profile.favorite_post_ids().is_empty());
        assert_eq!(profile.visited_post_ids(), ["p3".to_string()]);
    }

    #[test]
    fn test_restore_drops_duplicates() {
        let profile = Profile::restore(
            "u1".into(),
            Utc::now(),
            Utc::now(),
            vec!["p1".into(), "p1".into()],
            vec!["p2".into(), "p3".into(), "p2".into()],
            vec![],
            1,
        );
        assert_eq!(profile.post_ids(), ["p1".to_string()]);
        assert_eq!(
            profile.favorite_post_ids(),
            ["p2".to_string(), "p3".to_string()]
        );
        assert_eq!(
            profile.referenced_post_ids().into_iter().collect::<Vec<_>>(),
            vec!["p1", "p2", "p3"]
        );
    }

    #[test]
    fn test_loaded_document_drops_duplicates() {
        let json = serde_json::json!({
            "ownerId": "u1",
            "created": "2025-01-01T00:00:00Z",
            "updated": "2025-01-01T00:00:00Z",
            "postIds": ["p1", "p1"],
            "favoritePostIds": ["p2", "p3", "p2"],
            "version": 2
        });

        let profile: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.post_ids(), ["p1".to_string()]);
        assert_eq!(
            profile.favorite_post_ids(),
            ["p2".to_string(), "p3".to_string()]
        );
        assert!(profile.visited_post_ids().is_empty());
        assert!(profile.pending_changes().is_empty());
    }
}
