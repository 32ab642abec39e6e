//! Graph service.
//!
//! Bridges user identity to profile existence and owns the follow relation.
//! Every profile follows itself from the moment it becomes visible; this
//! service is the only place that edge is created, and it refuses to remove
//! it.

use std::sync::Arc;

use chrono::Utc;
use dwitter_common::{AppError, AppResult, IdGenerator};
use dwitter_db::{
    entities::profile,
    repositories::{FollowingRepository, ProfileRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowResult {
    /// A new follow edge was created.
    Following,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
    /// The profile tried to follow itself, which it always does already.
    #[serde(rename = "self")]
    SelfFollow,
}

/// Relation counts for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    /// Number of profiles followed, including the profile itself.
    pub following_count: u64,
    /// Number of followers, including the profile itself.
    pub followers_count: u64,
}

/// Graph service for business logic.
#[derive(Clone)]
pub struct GraphService {
    db: Arc<DatabaseConnection>,
    profile_repo: ProfileRepository,
    following_repo: FollowingRepository,
    id_gen: IdGenerator,
}

impl GraphService {
    /// Create a new graph service.
    ///
    /// `db` must be the connection the repositories were built on; it is used
    /// to run provisioning as a single transaction.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        profile_repo: ProfileRepository,
        following_repo: FollowingRepository,
    ) -> Self {
        Self {
            db,
            profile_repo,
            following_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Return the profile of a user, creating it on first sight.
    ///
    /// Creation and the self-follow edge are committed together. Concurrent
    /// first calls for the same user race on the unique `user_id` index; the
    /// loser reads back the winner's profile, so every caller sees the same
    /// profile id.
    pub async fn ensure_profile(&self, user_id: &str) -> AppResult<profile::Model> {
        if let Some(profile) = self.profile_repo.find_by_user_id(user_id).await? {
            self.repair_self_follow(&profile).await?;
            return Ok(profile);
        }

        match self.provision(user_id).await {
            Ok(profile) => {
                info!(user_id = %user_id, profile_id = %profile.id, "Provisioned profile");
                Ok(profile)
            }
            Err(AppError::AlreadyExists(_)) => {
                debug!(user_id = %user_id, "Profile created concurrently, reading it back");
                self.profile_repo.get_by_user_id(user_id).await
            }
            Err(e) => Err(e),
        }
    }

    /// Create a profile and its self-follow edge in one transaction.
    async fn provision(&self, user_id: &str) -> AppResult<profile::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = profile::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        // Dropping `txn` on an early return rolls it back.
        let profile = ProfileRepository::create_with(&txn, model).await?;
        FollowingRepository::add_with(&txn, &self.id_gen.generate(), &profile.id, &profile.id)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(profile)
    }

    /// Restore the self-follow edge of a profile that somehow lost it.
    async fn repair_self_follow(&self, profile: &profile::Model) -> AppResult<()> {
        if self
            .following_repo
            .is_following(&profile.id, &profile.id)
            .await?
        {
            return Ok(());
        }

        warn!(profile_id = %profile.id, "Profile is missing its self-follow edge, repairing");
        self.following_repo
            .add(&self.id_gen.generate(), &profile.id, &profile.id)
            .await?;
        Ok(())
    }

    /// Get a profile by ID.
    pub async fn get_profile(&self, profile_id: &str) -> AppResult<profile::Model> {
        self.profile_repo.get_by_id(profile_id).await
    }

    /// Follow a profile.
    ///
    /// Following oneself is accepted and changes nothing. Following twice is
    /// accepted and reported as [`FollowResult::AlreadyFollowing`].
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowResult> {
        if follower_id == followee_id {
            return Ok(FollowResult::SelfFollow);
        }

        self.profile_repo.get_by_id(follower_id).await?;
        self.profile_repo.get_by_id(followee_id).await?;

        let created = self
            .following_repo
            .add(&self.id_gen.generate(), follower_id, followee_id)
            .await?;

        if created {
            info!(follower_id = %follower_id, followee_id = %followee_id, "Followed profile");
            Ok(FollowResult::Following)
        } else {
            Ok(FollowResult::AlreadyFollowing)
        }
    }

    /// Unfollow a profile.
    ///
    /// Returns whether an edge was removed. The self-follow edge cannot be
    /// removed.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        if follower_id == followee_id {
            return Err(AppError::InvariantViolation(
                "A profile cannot unfollow itself".to_string(),
            ));
        }

        self.profile_repo.get_by_id(followee_id).await?;

        let removed = self.following_repo.remove(follower_id, followee_id).await?;
        if removed {
            info!(follower_id = %follower_id, followee_id = %followee_id, "Unfollowed profile");
        }

        Ok(removed)
    }

    /// Profiles followed by a profile, itself included.
    pub async fn get_following(&self, profile_id: &str) -> AppResult<Vec<profile::Model>> {
        self.profile_repo.get_by_id(profile_id).await?;
        let ids = self.following_repo.find_followee_ids(profile_id).await?;
        self.profile_repo.find_by_ids(&ids).await
    }

    /// Profiles following a profile, itself included.
    pub async fn get_followers(&self, profile_id: &str) -> AppResult<Vec<profile::Model>> {
        self.profile_repo.get_by_id(profile_id).await?;
        let ids = self.following_repo.find_follower_ids(profile_id).await?;
        self.profile_repo.find_by_ids(&ids).await
    }

    /// Check if one profile follows another.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.following_repo
            .is_following(follower_id, followee_id)
            .await
    }

    /// Relation counts for a profile.
    pub async fn stats(&self, profile_id: &str) -> AppResult<ProfileStats> {
        Ok(ProfileStats {
            following_count: self.following_repo.count_following(profile_id).await?,
            followers_count: self.following_repo.count_followers(profile_id).await?,
        })
    }
}
