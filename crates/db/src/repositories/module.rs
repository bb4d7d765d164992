//! Module repository.
//!
//! Besides plain lookups this provides the scoped module queries: modules
//! reachable by a university through its courses, and by a user through
//! their enrolled courses. Both return deduplicated [`Select`] builders.

use std::sync::Arc;

use crate::entities::{
    course, module, module_course, university, user_enrolled_course, Course, Module,
};
use crate::map_write_err;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select,
};

use super::course::CourseRepository;

/// Module repository for database operations.
#[derive(Clone)]
pub struct ModuleRepository {
    db: Arc<DatabaseConnection>,
}

fn module_ids_for_courses(course_ids: SelectStatement) -> SelectStatement {
    Query::select()
        .column(module_course::Column::ModuleId)
        .from(module_course::Entity)
        .and_where(module_course::Column::CourseId.in_subquery(course_ids))
        .to_owned()
}

impl ModuleRepository {
    /// Create a new module repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a module by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<module::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a module by ID through any connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<module::Model>> {
        Module::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a module by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<module::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Module not found: {id}")))
    }

    /// Find a module by its reference code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<module::Model>> {
        Module::find()
            .filter(module::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Modules reachable by a university through its courses.
    #[must_use]
    pub fn reachable_by_university(university_id: &str) -> Select<Module> {
        let course_ids = Query::select()
            .column(course::Column::Id)
            .from(course::Entity)
            .and_where(course::Column::UniversityId.eq(university_id))
            .to_owned();

        Module::find().filter(module::Column::Id.in_subquery(module_ids_for_courses(course_ids)))
    }

    /// Modules reachable by a user through their enrolled courses.
    #[must_use]
    pub fn reachable_by_user(user_id: &str) -> Select<Module> {
        let course_ids = Query::select()
            .column(user_enrolled_course::Column::CourseId)
            .from(user_enrolled_course::Entity)
            .and_where(user_enrolled_course::Column::UserId.eq(user_id))
            .to_owned();

        Module::find().filter(module::Column::Id.in_subquery(module_ids_for_courses(course_ids)))
    }

    /// Modules of a university ordered by name.
    pub async fn list_for_university(&self, university_id: &str) -> AppResult<Vec<module::Model>> {
        Self::reachable_by_university(university_id)
            .order_by_asc(module::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Modules a user can post about, ordered by name.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<module::Model>> {
        Self::reachable_by_user(user_id)
            .order_by_asc(module::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a user can reach a module through their enrolled courses.
    pub async fn is_reachable_by_user(&self, user_id: &str, module_id: &str) -> AppResult<bool> {
        let found = Self::reachable_by_user(user_id)
            .filter(module::Column::Id.eq(module_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.is_some())
    }

    /// The first module of a university, oldest first.
    pub async fn first_for_university(
        &self,
        university_id: &str,
    ) -> AppResult<Option<module::Model>> {
        Self::reachable_by_university(university_id)
            .order_by_asc(module::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Courses linked to a module, oldest first.
    pub async fn courses(&self, module_id: &str) -> AppResult<Vec<course::Model>> {
        Self::courses_in(self.db.as_ref(), module_id).await
    }

    /// Courses linked to a module through any connection, oldest first.
    pub async fn courses_in<C: ConnectionTrait>(
        conn: &C,
        module_id: &str,
    ) -> AppResult<Vec<course::Model>> {
        Course::find()
            .filter(
                course::Column::Id.in_subquery(
                    Query::select()
                        .column(module_course::Column::CourseId)
                        .from(module_course::Entity)
                        .and_where(module_course::Column::ModuleId.eq(module_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(course::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The university of a module: that of its first linked course.
    pub async fn university(&self, module_id: &str) -> AppResult<Option<university::Model>> {
        let Some(first) = self.courses(module_id).await?.into_iter().next() else {
            return Ok(None);
        };
        super::UniversityRepository::find_by_id_in(self.db.as_ref(), &first.university_id).await
    }

    /// Distinct university ids spanned by the given courses.
    pub async fn university_ids_of_courses_in<C: ConnectionTrait>(
        conn: &C,
        course_ids: impl IntoIterator<Item = String>,
    ) -> AppResult<Vec<String>> {
        let mut ids: Vec<String> = CourseRepository::find_by_ids_in(conn, course_ids)
            .await?
            .into_iter()
            .map(|c| c.university_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Insert a module through any connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: module::ActiveModel,
    ) -> AppResult<module::Model> {
        model.insert(conn).await.map_err(map_write_err)
    }

    /// Update a module through any connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: module::ActiveModel,
    ) -> AppResult<module::Model> {
        model.update(conn).await.map_err(map_write_err)
    }

    /// Delete a module. Fails while any post is about it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Module::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_write_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn create_test_module(id: &str, code: &str) -> module::Model {
        module::Model {
            id: id.to_string(),
            name: format!("Module {id}"),
            code: code.to_string(),
            year_started: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_reachable_by_university_sql() {
        let sql = ModuleRepository::reachable_by_university("u1")
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""course_id" IN (SELECT"#));
        assert!(sql.contains(r#""university_id" = 'u1'"#));
        assert!(!sql.contains("JOIN"));
    }

    #[test]
    fn test_reachable_by_user_sql() {
        let sql = ModuleRepository::reachable_by_user("user1")
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("user_enrolled_course"));
        assert!(sql.contains("'user1'"));
    }

    #[tokio::test]
    async fn test_find_by_code() {
        let module = create_test_module("m1", "LI-SE");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[module]])
                .into_connection(),
        );

        let repo = ModuleRepository::new(db);
        let result = repo.find_by_code("LI-SE").await.unwrap();

        assert_eq!(result.unwrap().id, "m1");
    }

    #[tokio::test]
    async fn test_is_reachable_by_user_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<module::Model>::new()])
                .into_connection(),
        );

        let repo = ModuleRepository::new(db);
        assert!(!repo.is_reachable_by_user("user1", "m1").await.unwrap());
    }
}
