//! Dweet entity.

use std::cmp::Ordering;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum dweet body length, in characters.
pub const MAX_BODY_LENGTH: usize = 140;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dweet")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author profile ID
    #[sea_orm(indexed)]
    pub author_id: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Server-assigned, never updated
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Newest-first ordering: `created_at` descending, then `id` ascending.
    #[must_use]
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::AuthorId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
