//! Report repository.

use std::sync::Arc;

use crate::entities::{report, Report};
use crate::map_write_err;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report not found: {id}")))
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Mark a report as solved.
    pub async fn mark_solved(&self, id: &str) -> AppResult<report::Model> {
        let report = self.get_by_id(id).await?;
        let mut active: report::ActiveModel = report.into();
        active.is_solved = Set(true);
        active.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Unsolved reports, oldest first (paginated).
    pub async fn find_unsolved(
        &self,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find()
            .filter(report::Column::IsSolved.eq(false))
            .order_by_asc(report::Column::Id);

        if let Some(id) = since_id {
            query = query.filter(report::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports made about a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::PostId.eq(post_id))
            .order_by_asc(report::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unsolved reports.
    pub async fn count_unsolved(&self) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::IsSolved.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::report::ReportReason;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_report(id: &str, solved: bool) -> report::Model {
        report::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            reporter_id: "user2".to_string(),
            reason: ReportReason::Spam,
            is_solved: solved,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_unsolved() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_report("r1", false)]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.find_unsolved(10, None).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].reason, ReportReason::Spam);
    }

    #[tokio::test]
    async fn test_mark_solved() {
        let open = create_test_report("r1", false);
        let solved = create_test_report("r1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open]])
                .append_query_results([[solved]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.mark_solved("r1").await.unwrap();

        assert!(result.is_solved);
    }

    #[tokio::test]
    async fn test_mark_solved_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert!(matches!(
            repo.mark_solved("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
