//! Core business logic for RateMyModule.
//!
//! Services validate every save before anything is written and route every
//! many-to-many change through a [`RelationAccessor`] carrying the
//! [`invariants`] hooks.

pub mod invariants;
pub mod services;
pub mod validation;

use std::sync::Arc;

use ratemymodule_common::Config;
use ratemymodule_db::relations::RelationAccessor;
use ratemymodule_db::repositories::{
    CourseRepository, ModuleRepository, PostRepository, ReportRepository, TagRepository,
    UniversityRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

pub use services::*;

/// Every service, sharing one connection and one set of relation hooks.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub universities: UniversityService,
    pub courses: CourseService,
    pub modules: ModuleService,
    pub tags: TagService,
    pub posts: PostService,
    pub reports: ReportService,
    pub analytics: AnalyticsService,
}

impl Services {
    /// Wire up every service over `db`.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let relations = RelationAccessor::new(db.clone(), Arc::new(invariants::registry()));

        let user_repo = UserRepository::new(db.clone());
        let university_repo = UniversityRepository::new(db.clone());
        let course_repo = CourseRepository::new(db.clone());
        let module_repo = ModuleRepository::new(db.clone());
        let post_repo = PostRepository::new(db.clone());

        Self {
            users: UserService::new(
                db.clone(),
                relations.clone(),
                config.registration.clone(),
            ),
            universities: UniversityService::new(university_repo.clone()),
            courses: CourseService::new(course_repo, university_repo, relations.clone()),
            modules: ModuleService::new(db.clone(), relations.clone()),
            tags: TagService::new(TagRepository::new(db.clone()), user_repo.clone()),
            posts: PostService::new(db.clone(), relations),
            reports: ReportService::new(
                ReportRepository::new(db),
                post_repo.clone(),
                user_repo,
            ),
            analytics: AnalyticsService::new(post_repo, module_repo),
        }
    }
}
