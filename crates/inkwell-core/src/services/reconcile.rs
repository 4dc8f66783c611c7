//! Post deletion cascade.
//!
//! Runs after the post document is gone and is not transactional with that
//! delete. A profile it fails to scrub keeps a dangling id until the next
//! attempt; read paths skip such ids.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use crate::domain::Profile;
use crate::error::RepoError;
use crate::ports::ProfileRepository;

/// A profile the reconciler could not scrub.
#[derive(Debug, Clone)]
pub struct ReconcileFailure {
    /// `None` when the reverse index lookup itself failed.
    pub owner_id: Option<String>,
    pub error: RepoError,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub post_id: String,
    /// Owners whose profile was rewritten.
    pub updated: Vec<String>,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    /// True when no profile is known to still reference the post.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Removes references to deleted posts from profiles.
#[derive(Clone)]
pub struct Reconciler {
    profiles: Arc<dyn ProfileRepository>,
    max_write_retries: u32,
}

impl Reconciler {
    pub fn new(profiles: Arc<dyn ProfileRepository>, max_write_retries: u32) -> Self {
        Self {
            profiles,
            max_write_retries,
        }
    }

    /// Scrub `post_id` from every profile that mentions it.
    pub async fn forget_post(&self, post_id: &str) -> ReconcileReport {
        let mut report = ReconcileReport {
            post_id: post_id.to_string(),
            updated: Vec::new(),
            failures: Vec::new(),
        };

        let holders = match self.profiles.find_referencing(post_id).await {
            Ok(holders) => holders,
            Err(error) => {
                tracing::warn!(post_id = %post_id, error = %error, "Reverse index lookup failed");
                report.failures.push(ReconcileFailure {
                    owner_id: None,
                    error,
                });
                return report;
            }
        };

        let outcomes = join_all(holders.into_iter().map(|profile| async move {
            let owner_id = profile.owner_id.clone();
            (owner_id, self.scrub(profile, post_id).await)
        }))
        .await;

        for (owner_id, outcome) in outcomes {
            match outcome {
                Ok(true) => report.updated.push(owner_id),
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        post_id = %post_id,
                        owner_id = %owner_id,
                        error = %error,
                        "Failed to remove deleted post from profile"
                    );
                    report.failures.push(ReconcileFailure {
                        owner_id: Some(owner_id),
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            post_id = %post_id,
            updated = report.updated.len(),
            failed = report.failures.len(),
            "Reconciliation finished"
        );

        report
    }

    /// Returns whether the profile had to be rewritten.
    async fn scrub(&self, mut profile: Profile, post_id: &str) -> Result<bool, RepoError> {
        let mut last_conflict = None;

        for _ in 0..=self.max_write_retries {
            if !profile.forget_post(post_id) {
                return Ok(false);
            }
            profile.updated = Utc::now();
            let expected = profile.version;

            match self.profiles.replace(profile.clone(), expected).await {
                Ok(_) => return Ok(true),
                // Deleted concurrently: nothing left to scrub.
                Err(RepoError::NotFound) => return Ok(false),
                Err(conflict @ RepoError::VersionConflict { .. }) => {
                    last_conflict = Some(conflict);
                    match self.profiles.find_by_key(&profile.owner_id).await? {
                        Some(fresh) => profile = fresh,
                        None => return Ok(false),
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_conflict.unwrap_or(RepoError::VersionConflict {
            expected: profile.version,
            actual: profile.version,
        }))
    }
}
