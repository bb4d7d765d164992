//! Service-level integration tests against a migrated in-memory SQLite
//! database, with every relation hook registered.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ratemymodule_common::config::{DatabaseConfig, RegistrationConfig, ServerConfig};
use ratemymodule_common::error::NON_FIELD_ERRORS;
use ratemymodule_common::{AppError, Config};
use ratemymodule_core::{
    CourseInput, CreateUserInput, ModuleInput, PostInput, RegisterInput, Services, TagInput,
    UniversityInput, UpdateUserInput,
};
use ratemymodule_db::entities::{course, module, report::ReportReason, university, user};
use ratemymodule_db::relations::{HookRegistry, Relation, RelationAccessor};
use ratemymodule_db::repositories::{PostFilter, TagKind};
use ratemymodule_db::test_utils::TestDatabase;
use sea_orm::DatabaseConnection;

const PASSWORD: &str = "correct horse battery";

struct World {
    db: Arc<DatabaseConnection>,
    services: Services,
    bham: university::Model,
    oxford: university::Model,
    compsci: course::Model,
    maths: course::Model,
    philosophy: course::Model,
    module: module::Model,
    student: user::Model,
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        registration: RegistrationConfig::default(),
    }
}

async fn create_university(services: &Services, name: &str, short: &str, domain: &str) -> university::Model {
    services
        .universities
        .create(UniversityInput {
            name: name.to_string(),
            short_name: short.to_string(),
            email_domain: domain.to_string(),
            founding_date: NaiveDate::from_ymd_opt(1900, 3, 24).unwrap(),
        })
        .await
        .unwrap()
}

async fn create_course(services: &Services, name: &str, university_id: &str) -> course::Model {
    services
        .courses
        .create(CourseInput {
            name: name.to_string(),
            student_type: format!("{name} Student"),
            university_id: university_id.to_string(),
        })
        .await
        .unwrap()
}

fn module_input(code: &str, course_ids: &[&str]) -> ModuleInput {
    ModuleInput {
        name: format!("Module {code}"),
        code: code.to_string(),
        year_started: NaiveDate::from_ymd_opt(2015, 9, 1).unwrap(),
        course_ids: course_ids.iter().map(ToString::to_string).collect(),
    }
}

fn register_input(email: &str, course_ids: &[&str]) -> RegisterInput {
    RegisterInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        course_ids: course_ids.iter().map(ToString::to_string).collect(),
    }
}

fn staff_input(email: &str) -> CreateUserInput {
    CreateUserInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        is_staff: true,
        is_superuser: false,
        course_ids: vec![],
    }
}

fn post_input(module_id: &str, overall: i16) -> PostInput {
    PostInput {
        module_id: module_id.to_string(),
        overall_rating: overall,
        difficulty_rating: Some(3),
        assessment_rating: None,
        teaching_rating: Some(5),
        content: "Great lectures, tough exam".to_string(),
        academic_year_start: 2023,
        tool_tag_ids: vec![],
        topic_tag_ids: vec![],
        other_tag_ids: vec![],
    }
}

/// Birmingham with Computer Science and Maths, Oxford with Philosophy, one
/// module taught on Computer Science and one enrolled student.
async fn world() -> World {
    let test_db = TestDatabase::in_memory().await.unwrap();
    let db = Arc::new(test_db.conn);
    let services = Services::new(db.clone(), &test_config());

    let bham = create_university(&services, "University of Birmingham", "UoB", "bham.ac.uk").await;
    let oxford = create_university(&services, "University of Oxford", "Ox", "ox.ac.uk").await;

    let compsci = create_course(&services, "Computer Science", &bham.id).await;
    let maths = create_course(&services, "Mathematics", &bham.id).await;
    let philosophy = create_course(&services, "Philosophy", &oxford.id).await;

    let module = services
        .modules
        .create(module_input("LI-SE", &[&compsci.id]))
        .await
        .unwrap();

    let student = services
        .users
        .register(register_input("a@bham.ac.uk", &[&compsci.id]))
        .await
        .unwrap();

    World {
        db,
        services,
        bham,
        oxford,
        compsci,
        maths,
        philosophy,
        module,
        student,
    }
}

fn is_integrity(result: &Result<(), AppError>) -> bool {
    matches!(result, Err(AppError::Integrity(_)))
}

// === Enrolment ===

#[tokio::test]
async fn test_student_enrols_only_at_email_university() {
    let w = world().await;

    let result = w
        .services
        .users
        .change_courses(&w.student.id, vec![w.compsci.id.clone(), w.philosophy.id.clone()])
        .await;
    assert!(is_integrity(&result));

    let result = w
        .services
        .courses
        .add_enrolled_users(&w.philosophy.id, vec![w.student.id.clone()])
        .await;
    assert!(is_integrity(&result));

    let enrolled = w.services.users.enrolled_course_ids(&w.student.id).await.unwrap();
    assert_eq!(enrolled, vec![w.compsci.id.clone()]);

    w.services
        .users
        .change_courses(&w.student.id, vec![w.compsci.id.clone(), w.maths.id.clone()])
        .await
        .unwrap();
    let enrolled = w.services.users.enrolled_course_ids(&w.student.id).await.unwrap();
    assert_eq!(enrolled.len(), 2);
}

#[tokio::test]
async fn test_register_at_other_university_is_rejected() {
    let w = world().await;

    let err = w
        .services
        .users
        .register(register_input("b@bham.ac.uk", &[&w.philosophy.id]))
        .await
        .unwrap_err();

    assert!(err.has_field_error("university"));
}

#[tokio::test]
async fn test_student_cannot_clear_courses() {
    let w = world().await;

    let result = w.services.users.change_courses(&w.student.id, vec![]).await;
    assert!(is_integrity(&result));

    let enrolled = w.services.users.enrolled_course_ids(&w.student.id).await.unwrap();
    assert_eq!(enrolled, vec![w.compsci.id.clone()]);
}

#[tokio::test]
async fn test_replacing_only_course_is_allowed() {
    let w = world().await;

    w.services
        .users
        .change_courses(&w.student.id, vec![w.maths.id.clone()])
        .await
        .unwrap();

    let enrolled = w.services.users.enrolled_course_ids(&w.student.id).await.unwrap();
    assert_eq!(enrolled, vec![w.maths.id.clone()]);
}

#[tokio::test]
async fn test_staff_may_drop_every_course() {
    let w = world().await;
    let staff = w
        .services
        .users
        .create_user(CreateUserInput {
            course_ids: vec![w.compsci.id.clone()],
            ..staff_input("lecturer@bham.ac.uk")
        })
        .await
        .unwrap();

    w.services.users.change_courses(&staff.id, vec![]).await.unwrap();

    assert!(w.services.users.enrolled_course_ids(&staff.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_course_cannot_drop_students_only_course() {
    let w = world().await;

    let result = w
        .services
        .courses
        .remove_enrolled_users(&w.compsci.id, vec![w.student.id.clone()])
        .await;
    assert!(is_integrity(&result));

    // With a second course the student can leave this one.
    w.services
        .courses
        .add_enrolled_users(&w.maths.id, vec![w.student.id.clone()])
        .await
        .unwrap();
    w.services
        .courses
        .remove_enrolled_users(&w.compsci.id, vec![w.student.id.clone()])
        .await
        .unwrap();

    let enrolled = w.services.users.enrolled_course_ids(&w.student.id).await.unwrap();
    assert_eq!(enrolled, vec![w.maths.id.clone()]);
}

#[tokio::test]
async fn test_staff_without_university_stays_within_one() {
    let w = world().await;
    let staff = w
        .services
        .users
        .create_user(staff_input("admin@ratemymodule.dev"))
        .await
        .unwrap();

    w.services
        .users
        .change_courses(&staff.id, vec![w.philosophy.id.clone()])
        .await
        .unwrap();

    let result = w
        .services
        .users
        .change_courses(&staff.id, vec![w.philosophy.id.clone(), w.compsci.id.clone()])
        .await;
    assert!(is_integrity(&result));
}

// === Courses ===

fn course_input(course: &course::Model, university_id: &str) -> CourseInput {
    CourseInput {
        name: course.name.clone(),
        student_type: course.student_type.clone(),
        university_id: university_id.to_string(),
    }
}

#[tokio::test]
async fn test_linked_course_keeps_its_university() {
    let w = world().await;
    w.services
        .courses
        .add_modules(&w.maths.id, vec![w.module.id.clone()])
        .await
        .unwrap();

    let result = w
        .services
        .courses
        .update(&w.maths.id, course_input(&w.maths, &w.oxford.id))
        .await;
    assert!(matches!(result, Err(AppError::Integrity(_))));

    let result = w
        .services
        .courses
        .update(&w.compsci.id, course_input(&w.compsci, &w.oxford.id))
        .await;
    assert!(matches!(result, Err(AppError::Integrity(_))));

    let maths = w.services.courses.get(&w.maths.id).await.unwrap();
    assert_eq!(maths.university_id, w.bham.id);
    let university = w.services.modules.university(&w.module.id).await.unwrap();
    assert_eq!(university.unwrap().id, w.bham.id);

    // Renaming in place is still allowed.
    let renamed = w
        .services
        .courses
        .update(
            &w.maths.id,
            CourseInput {
                name: "Pure Mathematics".to_string(),
                ..course_input(&w.maths, &w.bham.id)
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Pure Mathematics");
}

#[tokio::test]
async fn test_unlinked_course_may_change_university() {
    let w = world().await;
    let history = create_course(&w.services, "History", &w.bham.id).await;

    let moved = w
        .services
        .courses
        .update(&history.id, course_input(&history, &w.oxford.id))
        .await
        .unwrap();

    assert_eq!(moved.university_id, w.oxford.id);
}

#[tokio::test]
async fn test_deleting_only_course_fails() {
    let w = world().await;

    let result = w.services.courses.delete(&w.compsci.id).await;
    assert!(is_integrity(&result));

    assert_eq!(
        w.services.users.enrolled_course_ids(&w.student.id).await.unwrap(),
        vec![w.compsci.id.clone()]
    );
    assert_eq!(w.services.modules.courses(&w.module.id).await.unwrap().len(), 1);
    assert!(w.services.courses.get(&w.compsci.id).await.is_ok());
}

#[tokio::test]
async fn test_deleting_course_with_alternatives() {
    let w = world().await;
    w.services
        .courses
        .add_enrolled_users(&w.maths.id, vec![w.student.id.clone()])
        .await
        .unwrap();

    // The module still depends on Computer Science alone.
    let result = w.services.courses.delete(&w.compsci.id).await;
    assert!(is_integrity(&result));
    assert_eq!(w.services.users.enrolled_course_ids(&w.student.id).await.unwrap().len(), 2);

    w.services
        .modules
        .add_courses(&w.module.id, vec![w.maths.id.clone()])
        .await
        .unwrap();
    w.services.courses.delete(&w.compsci.id).await.unwrap();

    assert_eq!(
        w.services.users.enrolled_course_ids(&w.student.id).await.unwrap(),
        vec![w.maths.id.clone()]
    );
    let courses = w.services.modules.courses(&w.module.id).await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].id, w.maths.id);
    assert!(matches!(
        w.services.courses.get(&w.compsci.id).await,
        Err(AppError::NotFound(_))
    ));
}

// === Modules ===

#[tokio::test]
async fn test_module_keeps_its_only_course() {
    let w = world().await;

    let result = w
        .services
        .modules
        .remove_courses(&w.module.id, vec![w.compsci.id.clone()])
        .await;
    assert!(is_integrity(&result));

    let result = w
        .services
        .courses
        .remove_modules(&w.compsci.id, vec![w.module.id.clone()])
        .await;
    assert!(is_integrity(&result));

    let courses = w.services.modules.courses(&w.module.id).await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].id, w.compsci.id);
}

#[tokio::test]
async fn test_module_courses_span_one_university() {
    let w = world().await;

    let result = w
        .services
        .modules
        .add_courses(&w.module.id, vec![w.philosophy.id.clone()])
        .await;
    assert!(is_integrity(&result));

    let result = w
        .services
        .courses
        .add_modules(&w.philosophy.id, vec![w.module.id.clone()])
        .await;
    assert!(is_integrity(&result));

    w.services
        .courses
        .add_modules(&w.maths.id, vec![w.module.id.clone()])
        .await
        .unwrap();

    let university = w.services.modules.university(&w.module.id).await.unwrap();
    assert_eq!(university.unwrap().id, w.bham.id);
    assert_eq!(w.services.modules.courses(&w.module.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_module_validation() {
    let w = world().await;

    let err = w
        .services
        .modules
        .create(module_input("LI-SE", &[&w.compsci.id]))
        .await
        .unwrap_err();
    assert!(err.has_field_error("code"));

    let err = w
        .services
        .modules
        .create(module_input("LI-AI", &[&w.compsci.id, &w.philosophy.id]))
        .await
        .unwrap_err();
    assert!(err.has_field_error("course_set"));

    let found = w.services.modules.find_by_code("LI-SE").await.unwrap();
    assert_eq!(found.map(|m| m.id), Some(w.module.id.clone()));

    let first = w.services.modules.first_for_university(&w.bham.id).await.unwrap();
    assert_eq!(first.map(|m| m.id), Some(w.module.id.clone()));
    assert!(w
        .services
        .modules
        .first_for_university(&w.oxford.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_first_module_is_oldest() {
    let w = world().await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let later = w
        .services
        .modules
        .create(ModuleInput {
            name: "Algorithms".to_string(),
            ..module_input("LI-ALG", &[&w.compsci.id])
        })
        .await
        .unwrap();

    let first = w.services.modules.first_for_university(&w.bham.id).await.unwrap();
    assert_eq!(first.map(|m| m.id), Some(w.module.id.clone()));
    assert!(later.id > w.module.id);
}

#[tokio::test]
async fn test_repeated_course_ids_are_accepted() {
    let w = world().await;

    let module = w
        .services
        .modules
        .create(module_input("LI-DB", &[&w.compsci.id, &w.compsci.id]))
        .await
        .unwrap();
    assert_eq!(w.services.modules.courses(&module.id).await.unwrap().len(), 1);

    let user = w
        .services
        .users
        .register(register_input("b@bham.ac.uk", &[&w.maths.id, &w.maths.id]))
        .await
        .unwrap();
    assert_eq!(
        w.services.users.enrolled_course_ids(&user.id).await.unwrap(),
        vec![w.maths.id.clone()]
    );
}

// === Users ===

#[tokio::test]
async fn test_duplicate_email_across_sub_domains() {
    let w = world().await;

    let err = w
        .services
        .users
        .register(register_input("a@cs.bham.ac.uk", &[&w.compsci.id]))
        .await
        .unwrap_err();

    assert!(err.has_field_error("email"));
}

#[tokio::test]
async fn test_student_needs_university_email() {
    let w = world().await;

    let err = w
        .services
        .users
        .register(register_input("a@gmail.com", &[&w.compsci.id]))
        .await
        .unwrap_err();
    assert!(err.has_field_error("email"));

    let err = w
        .services
        .users
        .register(register_input("a@example.com", &[&w.compsci.id]))
        .await
        .unwrap_err();
    assert!(err.has_field_error("email"));
}

#[tokio::test]
async fn test_superuser_is_staff() {
    let w = world().await;

    let admin = w
        .services
        .users
        .create_superuser(staff_input("root@ratemymodule.dev"))
        .await
        .unwrap();
    assert!(admin.is_staff);
    assert!(admin.is_superuser);

    let updated = w
        .services
        .users
        .update(
            &admin.id,
            UpdateUserInput {
                is_staff: Some(false),
                ..UpdateUserInput::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_staff);
}

#[tokio::test]
async fn test_demoting_staff_revalidates_account() {
    let w = world().await;
    let staff = w
        .services
        .users
        .create_user(staff_input("admin@ratemymodule.dev"))
        .await
        .unwrap();

    let err = w
        .services
        .users
        .update(
            &staff.id,
            UpdateUserInput {
                is_staff: Some(false),
                ..UpdateUserInput::default()
            },
        )
        .await
        .unwrap_err();

    assert!(err.has_field_error("email"));
    assert!(err.has_field_error("enrolled_course_set"));
}

#[tokio::test]
async fn test_authenticate_records_login() {
    let w = world().await;

    let user = w
        .services
        .users
        .authenticate("a@BHAM.ac.uk", PASSWORD)
        .await
        .unwrap();
    assert!(user.last_login.is_some());

    let result = w.services.users.authenticate("a@bham.ac.uk", "wrong").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_duplicate_email_in_either_order() {
    let w = world().await;
    w.services
        .users
        .create_user(staff_input("jo@acme.org"))
        .await
        .unwrap();
    let err = w
        .services
        .users
        .create_user(staff_input("jo@cs.acme.org"))
        .await
        .unwrap_err();
    assert!(err.has_field_error("email"));

    let w = world().await;
    w.services
        .users
        .create_user(staff_input("jo@cs.acme.org"))
        .await
        .unwrap();
    let err = w
        .services
        .users
        .create_user(staff_input("jo@acme.org"))
        .await
        .unwrap_err();
    assert!(err.has_field_error("email"));
}

#[tokio::test]
async fn test_example_label_only_checked_before_public_suffix() {
    let w = world().await;

    let user = w
        .services
        .users
        .register(register_input("b@test.bham.ac.uk", &[&w.compsci.id]))
        .await
        .unwrap();
    assert_eq!(
        w.services.users.university(&user.id).await.unwrap().map(|u| u.id),
        Some(w.bham.id.clone())
    );

    let err = w
        .services
        .users
        .create_user(staff_input("jo@mail.example.co.uk"))
        .await
        .unwrap_err();
    assert!(err.has_field_error("email"));
}

// === Posts ===

#[tokio::test]
async fn test_second_post_for_module_fails() {
    let w = world().await;

    w.services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();

    let err = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 2))
        .await
        .unwrap_err();
    assert!(err.has_field_error(NON_FIELD_ERRORS));
}

#[tokio::test]
async fn test_post_requires_enrolled_module() {
    let w = world().await;
    let other = w
        .services
        .modules
        .create(module_input("PH-ETH", &[&w.philosophy.id]))
        .await
        .unwrap();

    let err = w
        .services
        .posts
        .create(&w.student.id, post_input(&other.id, 4))
        .await
        .unwrap_err();
    assert!(err.has_field_error("module"));
}

#[tokio::test]
async fn test_saving_post_keeps_author_liked() {
    let w = world().await;
    let post = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();

    let liked = w.services.users.liked_post_ids(&w.student.id).await.unwrap();
    assert_eq!(liked, vec![post.id.clone()]);

    // Tamper with the relation directly, bypassing the service.
    let raw = RelationAccessor::new(w.db.clone(), Arc::new(HookRegistry::new()));
    raw.remove(Relation::PostLikedUsers, &post.id, [w.student.id.as_str()])
        .await
        .unwrap();
    raw.add(Relation::PostDislikedUsers, &post.id, [w.student.id.as_str()])
        .await
        .unwrap();

    w.services
        .posts
        .update(&w.student.id, &post.id, post_input(&w.module.id, 5))
        .await
        .unwrap();

    let liked = raw.ids(Relation::PostLikedUsers, &post.id).await.unwrap();
    let disliked = raw.ids(Relation::PostDislikedUsers, &post.id).await.unwrap();
    assert!(liked.contains(&w.student.id));
    assert!(!disliked.contains(&w.student.id));
}

#[tokio::test]
async fn test_like_and_dislike() {
    let w = world().await;
    let post = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();
    let reader = w
        .services
        .users
        .register(register_input("b@bham.ac.uk", &[&w.compsci.id]))
        .await
        .unwrap();

    w.services.users.like_post(&reader.id, &post.id).await.unwrap();
    assert_eq!(w.services.posts.liked_count(&post.id).await.unwrap(), 2);

    w.services.users.dislike_post(&reader.id, &post.id).await.unwrap();
    assert_eq!(w.services.posts.liked_count(&post.id).await.unwrap(), 1);
    assert_eq!(w.services.posts.disliked_count(&post.id).await.unwrap(), 1);
    assert_eq!(
        w.services.users.disliked_post_ids(&reader.id).await.unwrap(),
        vec![post.id.clone()]
    );

    w.services.users.unlike_post(&reader.id, &post.id).await.unwrap();
    assert_eq!(w.services.posts.disliked_count(&post.id).await.unwrap(), 0);

    let result = w.services.users.dislike_post(&w.student.id, &post.id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_student_type() {
    let w = world().await;
    let post = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();

    let student_type = w.services.posts.student_type(&post.id).await.unwrap();
    assert_eq!(student_type, "Computer Science Student");
}

#[tokio::test]
async fn test_tag_filter_and_autocomplete() {
    let w = world().await;
    let python = w
        .services
        .tags
        .create(TagInput {
            kind: TagKind::Tool,
            name: "Python".to_string(),
            is_verified: true,
        })
        .await
        .unwrap();
    w.services
        .tags
        .create(TagInput {
            kind: TagKind::Topic,
            name: "Testing".to_string(),
            is_verified: false,
        })
        .await
        .unwrap();

    let err = w
        .services
        .tags
        .create(TagInput {
            kind: TagKind::Other,
            name: "PYTHON".to_string(),
            is_verified: false,
        })
        .await
        .unwrap_err();
    assert!(err.has_field_error("name"));

    let post = w
        .services
        .posts
        .create(
            &w.student.id,
            PostInput {
                tool_tag_ids: vec![python.id.clone()],
                ..post_input(&w.module.id, 4)
            },
        )
        .await
        .unwrap();

    let tagged = w
        .services
        .posts
        .list(
            &PostFilter {
                tags: vec!["Python".to_string(), "Testing".to_string()],
                ..PostFilter::default()
            },
            false,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, post.id);

    let suggestions = w
        .services
        .tags
        .autocomplete(TagKind::Tool, "yth", None)
        .await
        .unwrap();
    assert_eq!(suggestions.len(), 1);

    // Unverified tags are never suggested.
    let suggestions = w
        .services
        .tags
        .autocomplete(TagKind::Topic, "test", None)
        .await
        .unwrap();
    assert!(suggestions.is_empty());
}

// === Moderation ===

#[tokio::test]
async fn test_reporting_own_post_fails() {
    let w = world().await;
    let post = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();

    let err = w
        .services
        .reports
        .create(&w.student.id, &post.id, ReportReason::Spam)
        .await
        .unwrap_err();
    assert!(err.has_field_error("reporter"));
}

#[tokio::test]
async fn test_reported_and_hidden_posts_are_staff_only() {
    let w = world().await;
    let post = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();
    let reader = w
        .services
        .users
        .register(register_input("b@bham.ac.uk", &[&w.compsci.id]))
        .await
        .unwrap();
    let staff = w
        .services
        .users
        .create_user(staff_input("mod@bham.ac.uk"))
        .await
        .unwrap();

    let report = w
        .services
        .reports
        .create(&reader.id, &post.id, ReportReason::FalseInfo)
        .await
        .unwrap();
    assert_eq!(w.services.reports.count_unsolved().await.unwrap(), 1);

    let filter = PostFilter::default();
    assert!(w.services.posts.list(&filter, false, None, None).await.unwrap().is_empty());
    assert_eq!(w.services.posts.list(&filter, true, None, None).await.unwrap().len(), 1);

    let result = w.services.reports.resolve(&reader.id, &report.id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    w.services.reports.resolve(&staff.id, &report.id).await.unwrap();
    assert_eq!(w.services.reports.count_unsolved().await.unwrap(), 0);
    assert_eq!(w.services.posts.list(&filter, false, None, None).await.unwrap().len(), 1);

    w.services.posts.hide(&staff.id, &post.id).await.unwrap();
    assert!(w.services.posts.get_visible(&post.id, false).await.is_err());
    assert!(w.services.posts.get_visible(&post.id, true).await.is_ok());

    let summary = w.services.analytics.rating_summary(&w.module.id).await.unwrap();
    assert_eq!(summary.post_count, 0);

    w.services.posts.unhide(&staff.id, &post.id).await.unwrap();
    let summary = w.services.analytics.rating_summary(&w.module.id).await.unwrap();
    assert_eq!(summary.post_count, 1);
    assert_eq!(summary.overall.mean, Some(4.0));
    assert_eq!(summary.teaching.counts, [0, 0, 0, 0, 1]);
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let w = world().await;
    let post = w
        .services
        .posts
        .create(&w.student.id, post_input(&w.module.id, 4))
        .await
        .unwrap();

    w.services.users.delete_account(&w.student.id).await.unwrap();

    assert!(matches!(
        w.services.posts.get(&post.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(w.services.courses.enrolled(&w.student.id).await.unwrap().is_empty());
}
