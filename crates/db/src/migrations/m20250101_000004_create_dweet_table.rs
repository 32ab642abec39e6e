//! Create dweet table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dweet::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Dweet::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Dweet::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Dweet::Body).text().not_null())
                    .col(
                        ColumnDef::new(Dweet::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dweet_author")
                            .from(Dweet::Table, Dweet::AuthorId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (author_id, created_at) - per-author listing and feed reads
        manager
            .create_index(
                Index::create()
                    .name("idx_dweet_author_id_created_at")
                    .table(Dweet::Table)
                    .col(Dweet::AuthorId)
                    .col(Dweet::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dweet::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Dweet {
    Table,
    Id,
    AuthorId,
    Body,
    CreatedAt,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}
