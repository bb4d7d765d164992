//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod course;
pub mod module;
pub mod post;
pub mod report;
pub mod tag;
pub mod university;
pub mod user;

pub use analytics::{AnalyticsService, RatingDistribution, RatingSummary};
pub use course::{CourseInput, CourseService};
pub use module::{ModuleInput, ModuleService};
pub use post::{PostInput, PostService};
pub use report::ReportService;
pub use tag::{TagInput, TagService};
pub use university::{UniversityInput, UniversityService};
pub use user::{CreateUserInput, RegisterInput, UpdateUserInput, UserService};

use ratemymodule_common::{AppError, AppResult};
use ratemymodule_db::{entities::user as user_entity, repositories::UserRepository};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

/// Begin a transaction.
///
/// Reads that do not need to see uncommitted rows run before this, on the
/// shared connection.
pub(crate) async fn begin(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    db.begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

pub(crate) async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Load `actor_id` and fail unless they are staff.
pub(crate) async fn require_staff(
    user_repo: &UserRepository,
    actor_id: &str,
) -> AppResult<user_entity::Model> {
    let actor = user_repo.get_by_id(actor_id).await?;
    if !actor.is_staff {
        return Err(AppError::Forbidden("Staff only".to_string()));
    }
    Ok(actor)
}
