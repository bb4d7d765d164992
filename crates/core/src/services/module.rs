//! Module service.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ratemymodule_common::{AppResult, IdGenerator};
use ratemymodule_db::{
    entities::{course, module, university},
    relations::{Relation, RelationAccessor},
    repositories::{CourseRepository, ModuleRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use validator::Validate;

use super::{begin, commit};
use crate::validation::FieldErrors;

/// Module service for business logic.
#[derive(Clone)]
pub struct ModuleService {
    db: Arc<DatabaseConnection>,
    module_repo: ModuleRepository,
    course_repo: CourseRepository,
    relations: RelationAccessor,
    id_gen: IdGenerator,
}

/// Input for creating or updating a module.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModuleInput {
    #[validate(length(min = 1, max = 60))]
    pub name: String,

    /// Reference code, unique across all modules.
    #[validate(length(min = 1, max = 60))]
    pub code: String,

    pub year_started: NaiveDate,

    /// Courses teaching this module. At least one, all at one university.
    pub course_ids: Vec<String>,
}

impl ModuleService {
    /// Create a new module service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, relations: RelationAccessor) -> Self {
        Self {
            module_repo: ModuleRepository::new(db.clone()),
            course_repo: CourseRepository::new(db.clone()),
            db,
            relations,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a module linked to its courses.
    pub async fn create(&self, input: ModuleInput) -> AppResult<module::Model> {
        self.validate(&input, None).await?;

        let model = module::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            code: Set(input.code),
            year_started: Set(input.year_started),
            created_at: Set(Utc::now().into()),
        };

        let txn = begin(&self.db).await?;
        let module = ModuleRepository::create_in(&txn, model).await?;
        self.relations
            .add_in(&txn, Relation::ModuleCourses, &module.id, input.course_ids)
            .await?;
        commit(txn).await?;

        tracing::info!(module_id = %module.id, code = %module.code, "Created module");
        Ok(module)
    }

    /// Update a module and replace its courses.
    pub async fn update(&self, id: &str, input: ModuleInput) -> AppResult<module::Model> {
        let module = self.module_repo.get_by_id(id).await?;
        self.validate(&input, Some(id)).await?;

        let mut active: module::ActiveModel = module.into();
        active.name = Set(input.name);
        active.code = Set(input.code);
        active.year_started = Set(input.year_started);

        let txn = begin(&self.db).await?;
        let module = ModuleRepository::update_in(&txn, active).await?;
        self.relations
            .set_in(&txn, Relation::ModuleCourses, id, input.course_ids)
            .await?;
        commit(txn).await?;

        Ok(module)
    }

    /// Get a module by ID.
    pub async fn get(&self, id: &str) -> AppResult<module::Model> {
        self.module_repo.get_by_id(id).await
    }

    /// Find a module by its reference code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<module::Model>> {
        self.module_repo.find_by_code(code).await
    }

    /// The university of a module.
    pub async fn university(&self, id: &str) -> AppResult<Option<university::Model>> {
        self.module_repo.get_by_id(id).await?;
        self.module_repo.university(id).await
    }

    /// Courses teaching a module.
    pub async fn courses(&self, id: &str) -> AppResult<Vec<course::Model>> {
        self.module_repo.courses(id).await
    }

    /// The first module of a university, by name.
    pub async fn first_for_university(
        &self,
        university_id: &str,
    ) -> AppResult<Option<module::Model>> {
        self.module_repo.first_for_university(university_id).await
    }

    /// Modules taught at a university.
    pub async fn list_for_university(&self, university_id: &str) -> AppResult<Vec<module::Model>> {
        self.module_repo.list_for_university(university_id).await
    }

    /// Modules a user can post about.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<module::Model>> {
        self.module_repo.list_for_user(user_id).await
    }

    /// Link more courses to a module.
    pub async fn add_courses(&self, id: &str, course_ids: Vec<String>) -> AppResult<()> {
        self.relations
            .add(Relation::ModuleCourses, id, course_ids)
            .await
    }

    /// Unlink courses from a module. At least one course must remain.
    pub async fn remove_courses(&self, id: &str, course_ids: Vec<String>) -> AppResult<()> {
        self.relations
            .remove(Relation::ModuleCourses, id, course_ids)
            .await
    }

    /// Delete a module. Fails with an integrity error while posts refer to it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.module_repo.get_by_id(id).await?;
        self.module_repo.delete(id).await
    }

    async fn validate(&self, input: &ModuleInput, exclude_id: Option<&str>) -> AppResult<()> {
        let mut errors = FieldErrors::from_validate(input);

        if !errors.has("code")
            && self
                .module_repo
                .find_by_code(&input.code)
                .await?
                .is_some_and(|m| exclude_id != Some(m.id.as_str()))
        {
            errors.add("code", "unique", "A Module with that Code already exists.");
        }

        if input.course_ids.is_empty() {
            errors.add(
                "course_set",
                "required",
                "A module must be linked to at least one course.",
            );
        } else {
            let wanted: BTreeSet<&str> = input.course_ids.iter().map(String::as_str).collect();
            let courses = self.course_repo.find_by_ids(input.course_ids.clone()).await?;
            if courses.len() != wanted.len() {
                errors.add("course_set", "invalid", "Select valid courses.");
            }
            if courses
                .iter()
                .any(|c| c.university_id != courses[0].university_id)
            {
                errors.add(
                    "course_set",
                    "invalid",
                    "All the courses of a module must be at the same university.",
                );
            }
        }

        errors.into_result()
    }
}
