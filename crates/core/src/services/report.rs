//! Report service.

use chrono::Utc;
use ratemymodule_common::{AppError, AppResult, IdGenerator};
use ratemymodule_db::{
    entities::report::{self, ReportReason},
    repositories::{PostRepository, ReportRepository, UserRepository},
};
use sea_orm::Set;

use super::require_staff;

/// Default page size for the moderation queue.
const DEFAULT_LIMIT: u64 = 50;

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            report_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Report a post. Nobody can report their own post.
    ///
    /// The post stays hidden from non-staff viewers until the report is
    /// resolved.
    pub async fn create(
        &self,
        reporter_id: &str,
        post_id: &str,
        reason: ReportReason,
    ) -> AppResult<report::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.user_id == reporter_id {
            return Err(AppError::field(
                "reporter",
                "invalid",
                "You cannot report your own post.",
            ));
        }
        self.user_repo.get_by_id(reporter_id).await?;

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            reporter_id: Set(reporter_id.to_string()),
            reason: Set(reason),
            is_solved: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let report = self.report_repo.create(model).await?;
        tracing::info!(
            report_id = %report.id,
            post_id = %report.post_id,
            reason = report.reason.label(),
            "Post reported"
        );
        Ok(report)
    }

    /// Mark a report as solved. Staff only.
    pub async fn resolve(&self, actor_id: &str, id: &str) -> AppResult<report::Model> {
        require_staff(&self.user_repo, actor_id).await?;
        let report = self.report_repo.mark_solved(id).await?;
        tracing::info!(report_id = %id, actor_id = %actor_id, "Resolved report");
        Ok(report)
    }

    /// Unsolved reports, oldest first.
    pub async fn list_unsolved(
        &self,
        limit: Option<u64>,
        since_id: Option<&str>,
    ) -> AppResult<Vec<report::Model>> {
        self.report_repo
            .find_unsolved(limit.unwrap_or(DEFAULT_LIMIT), since_id)
            .await
    }

    /// Number of unsolved reports.
    pub async fn count_unsolved(&self) -> AppResult<u64> {
        self.report_repo.count_unsolved().await
    }

    /// Reports made about a post.
    pub async fn for_post(&self, post_id: &str) -> AppResult<Vec<report::Model>> {
        self.report_repo.find_by_post(post_id).await
    }
}
