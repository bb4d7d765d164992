//! Create course table migration.

use sea_orm_migration::prelude::*;

use super::m20240901_000002_create_university_table::University;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Course::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Course::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Course::Name).string_len(60).not_null())
                    .col(ColumnDef::new(Course::StudentType).string_len(60).not_null())
                    .col(ColumnDef::new(Course::UniversityId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Course::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_university")
                            .from(Course::Table, Course::UniversityId)
                            .to(University::Table, University::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (name, university_id) - course names are per university
        manager
            .create_index(
                Index::create()
                    .name("idx_course_name_university")
                    .table(Course::Table)
                    .col(Course::Name)
                    .col(Course::UniversityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: university_id (for scoping modules by university)
        manager
            .create_index(
                Index::create()
                    .name("idx_course_university_id")
                    .table(Course::Table)
                    .col(Course::UniversityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Course::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Course {
    Table,
    Id,
    Name,
    StudentType,
    UniversityId,
    CreatedAt,
}
