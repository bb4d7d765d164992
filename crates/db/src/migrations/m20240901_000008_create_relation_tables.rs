//! Create many-to-many join tables migration.
//!
//! Every join row cascades when either side is deleted.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `(table, left column, left target table, right column, right target table)`
const JOIN_TABLES: &[(&str, &str, &str, &str, &str)] = &[
    ("user_enrolled_course", "user_id", "user", "course_id", "course"),
    ("user_liked_post", "user_id", "user", "post_id", "post"),
    ("user_disliked_post", "user_id", "user", "post_id", "post"),
    ("module_course", "module_id", "module", "course_id", "course"),
    ("post_tool_tag", "post_id", "post", "tag_id", "tool_tag"),
    ("post_topic_tag", "post_id", "post", "tag_id", "topic_tag"),
    ("post_other_tag", "post_id", "post", "tag_id", "other_tag"),
];

fn create_join_table(
    table: &str,
    left: &str,
    left_target: &str,
    right: &str,
    right_target: &str,
) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new(left)).string_len(32).not_null())
        .col(ColumnDef::new(Alias::new(right)).string_len(32).not_null())
        .primary_key(
            Index::create()
                .col(Alias::new(left))
                .col(Alias::new(right)),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{table}_{left}"))
                .from(Alias::new(table), Alias::new(left))
                .to(Alias::new(left_target), Alias::new("id"))
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{table}_{right}"))
                .from(Alias::new(table), Alias::new(right))
                .to(Alias::new(right_target), Alias::new("id"))
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for &(table, left, left_target, right, right_target) in JOIN_TABLES {
            manager
                .create_table(create_join_table(
                    table,
                    left,
                    left_target,
                    right,
                    right_target,
                ))
                .await?;

            // Index: right-hand column (reverse lookups)
            manager
                .create_index(
                    Index::create()
                        .name(format!("idx_{table}_{right}"))
                        .table(Alias::new(table))
                        .col(Alias::new(right))
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for &(table, ..) in JOIN_TABLES.iter().rev() {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
