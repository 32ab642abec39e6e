//! Dweet repository.

use std::sync::Arc;

use crate::entities::{Dweet, dweet};
use crate::write_error;
use dwitter_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Dweet repository for database operations.
#[derive(Clone)]
pub struct DweetRepository {
    db: Arc<DatabaseConnection>,
}

impl DweetRepository {
    /// Create a new dweet repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a dweet by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<dweet::Model>> {
        Dweet::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a dweet by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<dweet::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dweet {id}")))
    }

    /// Create a new dweet.
    pub async fn create(&self, model: dweet::ActiveModel) -> AppResult<dweet::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "dweet author profile"))
    }

    /// All dweets written by any of the given authors, in no particular order.
    pub async fn find_by_authors(&self, author_ids: &[String]) -> AppResult<Vec<dweet::Model>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        Dweet::find()
            .filter(dweet::Column::AuthorId.is_in(author_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All dweets written by one author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<dweet::Model>> {
        let mut dweets = Dweet::find()
            .filter(dweet::Column::AuthorId.eq(author_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        dweets.sort_by(dweet::Model::cmp_newest_first);
        Ok(dweets)
    }

    /// Count dweets written by one author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Dweet::find()
            .filter(dweet::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
