//! Create post table migration.

use sea_orm_migration::prelude::*;

use super::m20240901_000001_create_user_table::User;
use super::m20240901_000004_create_module_table::Module;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::ModuleId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::OverallRating).small_integer().not_null())
                    .col(ColumnDef::new(Post::DifficultyRating).small_integer())
                    .col(ColumnDef::new(Post::AssessmentRating).small_integer())
                    .col(ColumnDef::new(Post::TeachingRating).small_integer())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(
                        ColumnDef::new(Post::AcademicYearStart)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Post::Hidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_module")
                            .from(Post::Table, Post::ModuleId)
                            .to(Module::Table, Module::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_user")
                            .from(Post::Table, Post::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one post per user per module
        manager
            .create_index(
                Index::create()
                    .name("idx_post_user_module")
                    .table(Post::Table)
                    .col(Post::UserId)
                    .col(Post::ModuleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: module_id (for per-module listings and analytics)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_module_id")
                    .table(Post::Table)
                    .col(Post::ModuleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Post {
    Table,
    Id,
    ModuleId,
    UserId,
    OverallRating,
    DifficultyRating,
    AssessmentRating,
    TeachingRating,
    Content,
    AcademicYearStart,
    Hidden,
    CreatedAt,
}
