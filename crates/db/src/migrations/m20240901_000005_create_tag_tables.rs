//! Create tag tables migration.
//!
//! The three tag variants share one shape and live in parallel tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [TagTable::ToolTag, TagTable::TopicTag, TagTable::OtherTag] {
            manager
                .create_table(
                    Table::create()
                        .table(table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tag::Id)
                                .string_len(32)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Tag::Name)
                                .string_len(60)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Tag::IsVerified)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Tag::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [TagTable::OtherTag, TagTable::TopicTag, TagTable::ToolTag] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(Iden, Clone, Copy)]
pub enum TagTable {
    ToolTag,
    TopicTag,
    OtherTag,
}

#[derive(Iden)]
pub enum Tag {
    Id,
    Name,
    IsVerified,
    CreatedAt,
}
