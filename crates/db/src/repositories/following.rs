//! Following repository.
//!
//! Stores the directed follow edge set. Followers are derived by querying the
//! same rows on `followee_id`; there is no separate inverse table.

use std::sync::Arc;

use crate::entities::{Following, following};
use crate::write_error;
use chrono::Utc;
use dwitter_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::OnConflict,
};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a following relationship by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a profile is following another profile.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, followee_id).await?.is_some())
    }

    /// Add a follow edge.
    ///
    /// Returns `true` if the edge was created and `false` if it already
    /// existed. Fails with [`AppError::NotFound`] when either profile is
    /// missing.
    pub async fn add(&self, id: &str, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Self::add_with(self.db.as_ref(), id, follower_id, followee_id).await
    }

    /// Same as [`Self::add`], on an arbitrary connection or transaction.
    pub async fn add_with<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<bool> {
        let model = following::ActiveModel {
            id: Set(id.to_string()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let inserted = Following::insert(model)
            .on_conflict(
                OnConflict::columns([
                    following::Column::FollowerId,
                    following::Column::FolloweeId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| write_error(e, &format!("profile {follower_id} or {followee_id}")))?;

        Ok(inserted > 0)
    }

    /// Remove a follow edge.
    ///
    /// Returns `true` if an edge was deleted; removing a missing edge is a
    /// no-op.
    pub async fn remove(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// IDs of the profiles a profile follows, in follow order.
    pub async fn find_followee_ids(&self, follower_id: &str) -> AppResult<Vec<String>> {
        Following::find()
            .select_only()
            .column(following::Column::FolloweeId)
            .filter(following::Column::FollowerId.eq(follower_id))
            .order_by_asc(following::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the profiles following a profile, in follow order.
    pub async fn find_follower_ids(&self, followee_id: &str) -> AppResult<Vec<String>> {
        Following::find()
            .select_only()
            .column(following::Column::FollowerId)
            .filter(following::Column::FolloweeId.eq(followee_id))
            .order_by_asc(following::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of a profile.
    pub async fn count_followers(&self, profile_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(profile_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count profiles followed by a profile.
    pub async fn count_following(&self, profile_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowerId.eq(profile_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_following(id: &str, follower_id: &str, followee_id: &str) -> following::Model {
        following::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let following = create_test_following("f1", "p1", "p2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[following.clone()]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let result = repo.find_by_pair("p1", "p2").await.unwrap();

        assert_eq!(result, Some(following));
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<following::Model>::new()])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let result = repo.is_following("p1", "p3").await.unwrap();

        assert!(!result);
    }

    #[tokio::test]
    async fn test_add_new_edge() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let created = repo.add("f1", "p1", "p2").await.unwrap();

        assert!(created);
    }

    #[tokio::test]
    async fn test_add_existing_edge_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0)])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let created = repo.add("f2", "p1", "p2").await.unwrap();

        assert!(!created);
    }

    #[tokio::test]
    async fn test_remove_missing_edge_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0)])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let removed = repo.remove("p1", "p2").await.unwrap();

        assert!(!removed);
    }

    #[tokio::test]
    async fn test_remove_existing_edge() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let removed = repo.remove("p1", "p2").await.unwrap();

        assert!(removed);
    }
}
