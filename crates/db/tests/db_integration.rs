//! Database integration tests.
//!
//! Schema behaviour is checked against a migrated in-memory SQLite database.
//! The tests marked `#[ignore]` require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `ratemymodule_test`)
//!   `TEST_DB_PASSWORD` (default: `ratemymodule_test`)
//!   `TEST_DB_NAME` (default: `ratemymodule_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ratemymodule_common::AppError;
use ratemymodule_db::entities::{course, module, post, university, user};
use ratemymodule_db::relations::{HookRegistry, Relation, RelationAccessor};
use ratemymodule_db::repositories::{
    CourseRepository, ModuleRepository, PostFilter, PostRepository, UniversityRepository,
    UserRepository,
};
use ratemymodule_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

struct Fixture {
    db: Arc<DatabaseConnection>,
    university: university::Model,
    course: course::Model,
    module: module::Model,
    user: user::Model,
}

async fn fixture() -> Fixture {
    let test_db = TestDatabase::in_memory().await.unwrap();
    let db = Arc::new(test_db.conn);

    let university = university::ActiveModel {
        id: Set("uni1".to_string()),
        name: Set("University of Birmingham".to_string()),
        short_name: Set("UoB".to_string()),
        email_domain: Set("bham.ac.uk".to_string()),
        founding_date: Set(NaiveDate::from_ymd_opt(1900, 3, 24).unwrap()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let course = course::ActiveModel {
        id: Set("course1".to_string()),
        name: Set("Computer Science".to_string()),
        student_type: Set("Undergraduate".to_string()),
        university_id: Set(university.id.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let module = module::ActiveModel {
        id: Set("module1".to_string()),
        name: Set("Software Engineering".to_string()),
        code: Set("LI-SE".to_string()),
        year_started: Set(NaiveDate::from_ymd_opt(2015, 9, 1).unwrap()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let user = user::ActiveModel {
        id: Set("user1".to_string()),
        email: Set("a@bham.ac.uk".to_string()),
        password_hash: Set("hash".to_string()),
        is_staff: Set(false),
        is_superuser: Set(false),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let accessor = RelationAccessor::new(db.clone(), Arc::new(HookRegistry::new()));
    accessor
        .add(Relation::ModuleCourses, &module.id, [&course.id])
        .await
        .unwrap();
    accessor
        .add(Relation::UserEnrolledCourses, &user.id, [&course.id])
        .await
        .unwrap();

    Fixture {
        db,
        university,
        course,
        module,
        user,
    }
}

async fn insert_post(db: &DatabaseConnection, id: &str, user_id: &str, module_id: &str) -> post::Model {
    post::ActiveModel {
        id: Set(id.to_string()),
        module_id: Set(module_id.to_string()),
        user_id: Set(user_id.to_string()),
        overall_rating: Set(4),
        difficulty_rating: Set(None),
        assessment_rating: Set(None),
        teaching_rating: Set(None),
        content: Set("Great lectures".to_string()),
        academic_year_start: Set(2023),
        hidden: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_reverse_relations_share_rows() {
    let f = fixture().await;
    let accessor = RelationAccessor::new(f.db.clone(), Arc::new(HookRegistry::new()));

    let users = accessor
        .ids(Relation::CourseEnrolledUsers, &f.course.id)
        .await
        .unwrap();
    assert!(users.contains(&f.user.id));

    let modules = accessor
        .ids(Relation::CourseModules, &f.course.id)
        .await
        .unwrap();
    assert!(modules.contains(&f.module.id));
}

#[tokio::test]
async fn test_scoped_module_queries() {
    let f = fixture().await;
    let repo = ModuleRepository::new(f.db.clone());

    let for_university = repo.list_for_university(&f.university.id).await.unwrap();
    assert_eq!(for_university.len(), 1);

    let for_user = repo.list_for_user(&f.user.id).await.unwrap();
    assert_eq!(for_user[0].id, f.module.id);

    assert!(repo.is_reachable_by_user(&f.user.id, &f.module.id).await.unwrap());
    assert_eq!(
        repo.university(&f.module.id).await.unwrap().unwrap().id,
        f.university.id
    );
}

#[tokio::test]
async fn test_scoped_module_query_is_distinct() {
    let f = fixture().await;

    let second = course::ActiveModel {
        id: Set("course2".to_string()),
        name: Set("Mathematics".to_string()),
        student_type: Set("Undergraduate".to_string()),
        university_id: Set(f.university.id.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(f.db.as_ref())
    .await
    .unwrap();

    let accessor = RelationAccessor::new(f.db.clone(), Arc::new(HookRegistry::new()));
    accessor
        .add(Relation::ModuleCourses, &f.module.id, [&second.id])
        .await
        .unwrap();

    let repo = ModuleRepository::new(f.db.clone());
    assert_eq!(repo.list_for_university(&f.university.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unique_post_per_user_and_module() {
    let f = fixture().await;
    insert_post(&f.db, "post1", &f.user.id, &f.module.id).await;

    let duplicate = post::ActiveModel {
        id: Set("post2".to_string()),
        module_id: Set(f.module.id.clone()),
        user_id: Set(f.user.id.clone()),
        overall_rating: Set(2),
        difficulty_rating: Set(None),
        assessment_rating: Set(None),
        teaching_rating: Set(None),
        content: Set("Again".to_string()),
        academic_year_start: Set(2023),
        hidden: Set(false),
        created_at: Set(Utc::now().into()),
    };
    let result = PostRepository::create_in(f.db.as_ref(), duplicate).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_deleting_user_cascades() {
    let f = fixture().await;
    insert_post(&f.db, "post1", &f.user.id, &f.module.id).await;

    UserRepository::new(f.db.clone())
        .delete(&f.user.id)
        .await
        .unwrap();

    let posts = PostRepository::new(f.db.clone());
    assert!(posts.find_by_id("post1").await.unwrap().is_none());

    let courses = CourseRepository::new(f.db.clone());
    assert!(courses.find_enrolled(&f.user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_university_with_courses_cannot_be_deleted() {
    let f = fixture().await;

    let result = UniversityRepository::new(f.db.clone())
        .delete(&f.university.id)
        .await;

    assert!(result.is_err());
    let still_there = UniversityRepository::new(f.db.clone())
        .find_by_id(&f.university.id)
        .await
        .unwrap();
    assert!(still_there.is_some());
}

#[tokio::test]
async fn test_viewable_hides_hidden_posts_from_students() {
    let f = fixture().await;
    insert_post(&f.db, "post1", &f.user.id, &f.module.id).await;

    let repo = PostRepository::new(f.db.clone());
    repo.set_hidden("post1", true).await.unwrap();

    let filter = PostFilter {
        module_id: Some(f.module.id.clone()),
        ..PostFilter::default()
    };
    assert!(repo.list(&filter, false, 10, 0).await.unwrap().is_empty());
    assert_eq!(repo.list(&filter, true, 10, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_first_shared_course_student_type() {
    let f = fixture().await;

    let course = PostRepository::new(f.db.clone())
        .first_shared_course(&f.module.id, &f.user.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(course.student_type, "Undergraduate");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
