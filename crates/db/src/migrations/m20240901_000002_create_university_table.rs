//! Create university table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(University::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(University::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(University::Name)
                            .string_len(60)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(University::ShortName).string_len(5).not_null())
                    .col(
                        ColumnDef::new(University::EmailDomain)
                            .string_len(253)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(University::FoundingDate).date().not_null())
                    .col(
                        ColumnDef::new(University::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(University::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum University {
    Table,
    Id,
    Name,
    ShortName,
    EmailDomain,
    FoundingDate,
    CreatedAt,
}
