//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20240901_000001_create_user_table;
mod m20240901_000002_create_university_table;
mod m20240901_000003_create_course_table;
mod m20240901_000004_create_module_table;
mod m20240901_000005_create_tag_tables;
mod m20240901_000006_create_post_table;
mod m20240901_000007_create_report_table;
mod m20240901_000008_create_relation_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_user_table::Migration),
            Box::new(m20240901_000002_create_university_table::Migration),
            Box::new(m20240901_000003_create_course_table::Migration),
            Box::new(m20240901_000004_create_module_table::Migration),
            Box::new(m20240901_000005_create_tag_tables::Migration),
            Box::new(m20240901_000006_create_post_table::Migration),
            Box::new(m20240901_000007_create_report_table::Migration),
            Box::new(m20240901_000008_create_relation_tables::Migration),
        ]
    }
}
