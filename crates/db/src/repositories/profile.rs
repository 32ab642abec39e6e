//! Profile repository.

use std::sync::Arc;

use crate::entities::{Profile, profile};
use crate::write_error;
use dwitter_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a profile by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ProfileNotFound(id.to_string()))
    }

    /// Find the profile owned by a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the profile owned by a user, returning an error if not found.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<profile::Model> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::ProfileNotFound(format!("user {user_id}")))
    }

    /// Find profiles by IDs, in ID order. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<profile::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Profile::find()
            .filter(profile::Column::Id.is_in(ids.iter().cloned()))
            .order_by_asc(profile::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new profile.
    ///
    /// Fails with [`AppError::AlreadyExists`] when the user already owns a
    /// profile. The new profile follows nobody.
    pub async fn create(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        Self::create_with(self.db.as_ref(), model).await
    }

    /// Same as [`Self::create`], on an arbitrary connection or transaction.
    pub async fn create_with<C: ConnectionTrait>(
        conn: &C,
        model: profile::ActiveModel,
    ) -> AppResult<profile::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| write_error(e, "profile for this user"))
    }

    /// List every profile except the one owned by `user_id`, oldest first.
    pub async fn find_all_except_user(&self, user_id: &str) -> AppResult<Vec<profile::Model>> {
        Profile::find()
            .filter(profile::Column::UserId.ne(user_id))
            .order_by_asc(profile::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count profiles.
    pub async fn count(&self) -> AppResult<u64> {
        Profile::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
