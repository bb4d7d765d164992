//! Course service.

use chrono::Utc;
use ratemymodule_common::{error::NON_FIELD_ERRORS, AppError, AppResult, IdGenerator};
use ratemymodule_db::{
    entities::course,
    relations::{Relation, RelationAccessor},
    repositories::{CourseRepository, UniversityRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::{begin, commit};
use crate::validation::FieldErrors;

/// Course service for business logic.
#[derive(Clone)]
pub struct CourseService {
    course_repo: CourseRepository,
    university_repo: UniversityRepository,
    relations: RelationAccessor,
    id_gen: IdGenerator,
}

/// Input for creating or updating a course.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseInput {
    #[validate(length(min = 1, max = 60))]
    pub name: String,

    /// How students on this course describe themselves, e.g. "CompSci Student".
    #[validate(length(min = 1, max = 60))]
    pub student_type: String,

    pub university_id: String,
}

impl CourseService {
    /// Create a new course service.
    #[must_use]
    pub const fn new(
        course_repo: CourseRepository,
        university_repo: UniversityRepository,
        relations: RelationAccessor,
    ) -> Self {
        Self {
            course_repo,
            university_repo,
            relations,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a course.
    pub async fn create(&self, input: CourseInput) -> AppResult<course::Model> {
        self.validate(&input, None).await?;

        let model = course::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            student_type: Set(input.student_type),
            university_id: Set(input.university_id),
            created_at: Set(Utc::now().into()),
        };

        let course = self.course_repo.create(model).await?;
        tracing::info!(course_id = %course.id, university_id = %course.university_id, "Created course");
        Ok(course)
    }

    /// Update a course.
    ///
    /// A course with linked modules or enrolled users cannot move to another
    /// university.
    pub async fn update(&self, id: &str, input: CourseInput) -> AppResult<course::Model> {
        let course = self.course_repo.get_by_id(id).await?;
        self.validate(&input, Some(id)).await?;
        let moving = course.university_id != input.university_id;

        let txn = begin(self.relations.connection()).await?;
        if moving {
            let modules = RelationAccessor::ids_in(&txn, Relation::CourseModules, id).await?;
            let users = RelationAccessor::ids_in(&txn, Relation::CourseEnrolledUsers, id).await?;
            if !modules.is_empty() || !users.is_empty() {
                tracing::warn!(course_id = %id, "Refused to move a linked course");
                return Err(AppError::Integrity(
                    "A course with modules or enrolled users cannot change university.".to_string(),
                ));
            }
        }

        let mut active: course::ActiveModel = course.into();
        active.name = Set(input.name);
        active.student_type = Set(input.student_type);
        active.university_id = Set(input.university_id);

        let course = CourseRepository::update_in(&txn, active).await?;
        commit(txn).await?;
        Ok(course)
    }

    /// Get a course by ID.
    pub async fn get(&self, id: &str) -> AppResult<course::Model> {
        self.course_repo.get_by_id(id).await
    }

    /// Courses of a university.
    pub async fn list_by_university(&self, university_id: &str) -> AppResult<Vec<course::Model>> {
        self.course_repo.list_by_university(university_id).await
    }

    /// Courses a user is enrolled in.
    pub async fn enrolled(&self, user_id: &str) -> AppResult<Vec<course::Model>> {
        self.course_repo.find_enrolled(user_id).await
    }

    /// Delete a course.
    ///
    /// Its users and modules are unlinked through the hooks first, so the
    /// delete fails if it would leave a student or a module with no course.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.course_repo.get_by_id(id).await?;

        let txn = begin(self.relations.connection()).await?;
        self.relations
            .clear_in(&txn, Relation::CourseEnrolledUsers, id)
            .await?;
        self.relations
            .clear_in(&txn, Relation::CourseModules, id)
            .await?;
        CourseRepository::delete_in(&txn, id).await?;
        commit(txn).await?;

        tracing::info!(course_id = %id, "Deleted course");
        Ok(())
    }

    /// Link modules to a course.
    pub async fn add_modules(&self, id: &str, module_ids: Vec<String>) -> AppResult<()> {
        self.relations
            .add(Relation::CourseModules, id, module_ids)
            .await
    }

    /// Unlink modules from a course. No module may be left without a course.
    pub async fn remove_modules(&self, id: &str, module_ids: Vec<String>) -> AppResult<()> {
        self.relations
            .remove(Relation::CourseModules, id, module_ids)
            .await
    }

    /// Enrol users on a course.
    pub async fn add_enrolled_users(&self, id: &str, user_ids: Vec<String>) -> AppResult<()> {
        self.relations
            .add(Relation::CourseEnrolledUsers, id, user_ids)
            .await
    }

    /// Unenrol users from a course. No student may be left without a course.
    pub async fn remove_enrolled_users(&self, id: &str, user_ids: Vec<String>) -> AppResult<()> {
        self.relations
            .remove(Relation::CourseEnrolledUsers, id, user_ids)
            .await
    }

    async fn validate(&self, input: &CourseInput, exclude_id: Option<&str>) -> AppResult<()> {
        let mut errors = FieldErrors::from_validate(input);

        if self
            .university_repo
            .find_by_id(&input.university_id)
            .await?
            .is_none()
        {
            errors.add("university", "invalid", "Select a valid university.");
        } else if !errors.has("name")
            && self
                .course_repo
                .find_by_name_and_university(&input.name, &input.university_id)
                .await?
                .is_some_and(|c| exclude_id != Some(c.id.as_str()))
        {
            errors.add(
                NON_FIELD_ERRORS,
                "unique",
                "A Course with that Name and University already exists.",
            );
        }

        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ratemymodule_db::entities::university;
    use ratemymodule_db::relations::HookRegistry;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_service(db: MockDatabase) -> CourseService {
        let db = Arc::new(db.into_connection());
        CourseService::new(
            CourseRepository::new(db.clone()),
            UniversityRepository::new(db.clone()),
            RelationAccessor::new(db, Arc::new(HookRegistry::new())),
        )
    }

    #[tokio::test]
    async fn test_create_requires_existing_university() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<university::Model>::new()]);
        let service = create_service(db);

        let err = service
            .create(CourseInput {
                name: "Computer Science".to_string(),
                student_type: String::new(),
                university_id: "missing".to_string(),
            })
            .await
            .unwrap_err();

        assert!(err.has_field_error("university"));
        assert!(err.has_field_error("student_type"));
    }
}
