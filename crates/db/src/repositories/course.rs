//! Course repository.

use std::sync::Arc;

use crate::entities::{course, user_enrolled_course, Course};
use crate::map_write_err;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Course repository for database operations.
#[derive(Clone)]
pub struct CourseRepository {
    db: Arc<DatabaseConnection>,
}

impl CourseRepository {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a course by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<course::Model>> {
        Course::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a course by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<course::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course not found: {id}")))
    }

    /// Find courses by ID.
    pub async fn find_by_ids(
        &self,
        ids: impl IntoIterator<Item = String>,
    ) -> AppResult<Vec<course::Model>> {
        Self::find_by_ids_in(self.db.as_ref(), ids).await
    }

    /// Find courses by ID through any connection.
    pub async fn find_by_ids_in<C: ConnectionTrait>(
        conn: &C,
        ids: impl IntoIterator<Item = String>,
    ) -> AppResult<Vec<course::Model>> {
        Course::find()
            .filter(course::Column::Id.is_in(ids))
            .order_by_asc(course::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a course by name within a university.
    pub async fn find_by_name_and_university(
        &self,
        name: &str,
        university_id: &str,
    ) -> AppResult<Option<course::Model>> {
        Course::find()
            .filter(course::Column::Name.eq(name))
            .filter(course::Column::UniversityId.eq(university_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Courses a user is enrolled in.
    pub async fn find_enrolled(&self, user_id: &str) -> AppResult<Vec<course::Model>> {
        Self::find_enrolled_in(self.db.as_ref(), user_id).await
    }

    /// Courses a user is enrolled in, through any connection.
    pub async fn find_enrolled_in<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
    ) -> AppResult<Vec<course::Model>> {
        Course::find()
            .filter(
                course::Column::Id.in_subquery(
                    Query::select()
                        .column(user_enrolled_course::Column::CourseId)
                        .from(user_enrolled_course::Entity)
                        .and_where(user_enrolled_course::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(course::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Courses of a university ordered by name.
    pub async fn list_by_university(&self, university_id: &str) -> AppResult<Vec<course::Model>> {
        Course::find()
            .filter(course::Column::UniversityId.eq(university_id))
            .order_by_asc(course::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new course.
    pub async fn create(&self, model: course::ActiveModel) -> AppResult<course::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a course through any connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: course::ActiveModel,
    ) -> AppResult<course::Model> {
        model.update(conn).await.map_err(map_write_err)
    }

    /// Delete a course through any connection. Join rows go with it, so
    /// callers clear the relations through the hooks first.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        Course::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_course(id: &str, university_id: &str) -> course::Model {
        course::Model {
            id: id.to_string(),
            name: format!("Course {id}"),
            student_type: "Undergraduate".to_string(),
            university_id: university_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let c1 = create_test_course("c1", "u1");
        let c2 = create_test_course("c2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CourseRepository::new(db);
        let result = repo
            .find_by_ids(["c1".to_string(), "c2".to_string()])
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<course::Model>::new()])
                .into_connection(),
        );

        let repo = CourseRepository::new(db);
        assert!(matches!(
            repo.get_by_id("c9").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_enrolled_uses_subquery() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_course("c1", "u1")]])
                .into_connection(),
        );

        let repo = CourseRepository::new(db.clone());
        let result = repo.find_enrolled("user1").await.unwrap();
        assert_eq!(result.len(), 1);
        drop(repo);

        let db = Arc::try_unwrap(db).ok().unwrap();
        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("user_enrolled_course"));
    }
}
