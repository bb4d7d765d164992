//! Relational invariants enforced on many-to-many changes.
//!
//! Each hook runs inside the transaction of the change it checks and reads
//! through that transaction only. Rejections are [`AppError::Integrity`].
//!
//! | relation                     | change        | rule                                              |
//! |------------------------------|---------------|---------------------------------------------------|
//! | user → courses               | remove, clear | non-staff keep at least one course                |
//! | course → users               | remove, clear | no non-staff user loses their last course         |
//! | module → courses             | remove, clear | a module keeps at least one course                |
//! | course → modules             | remove, clear | no module loses its last course                   |
//! | user ↔ course                | add           | courses belong to the user's email university     |
//! | module ↔ course              | add           | a module's courses span one university            |

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use ratemymodule_common::{split_email, AppError, AppResult};
use ratemymodule_db::entities::user;
use ratemymodule_db::relations::{
    ChangeKind, HookRegistry, Relation, RelationAccessor, RelationChange, RelationHook,
};
use ratemymodule_db::repositories::{
    CourseRepository, ModuleRepository, UniversityRepository, UserRepository,
};
use sea_orm::DatabaseTransaction;

const REMOVALS: &[ChangeKind] = &[ChangeKind::Remove, ChangeKind::Clear];
const ADDITIONS: &[ChangeKind] = &[ChangeKind::Add];

/// Register every invariant hook.
pub fn register(registry: &mut HookRegistry) {
    registry
        .register(
            Relation::UserEnrolledCourses,
            REMOVALS,
            Arc::new(EnrolledCoursesNotEmpty),
        )
        .register(
            Relation::CourseEnrolledUsers,
            REMOVALS,
            Arc::new(EnrolledUsersKeepACourse),
        )
        .register(Relation::ModuleCourses, REMOVALS, Arc::new(ModuleCoursesNotEmpty))
        .register(Relation::CourseModules, REMOVALS, Arc::new(ModulesKeepACourse))
        .register(
            Relation::UserEnrolledCourses,
            ADDITIONS,
            Arc::new(EnrolmentMatchesUniversity),
        )
        .register(
            Relation::CourseEnrolledUsers,
            ADDITIONS,
            Arc::new(EnrolmentMatchesUniversity),
        )
        .register(Relation::ModuleCourses, ADDITIONS, Arc::new(ModuleSpansOneUniversity))
        .register(Relation::CourseModules, ADDITIONS, Arc::new(ModuleSpansOneUniversity));
}

/// A registry holding every invariant hook.
#[must_use]
pub fn registry() -> HookRegistry {
    let mut registry = HookRegistry::new();
    register(&mut registry);
    registry
}

async fn load_user(txn: &DatabaseTransaction, id: &str) -> AppResult<user::Model> {
    UserRepository::find_by_id_in(txn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
}

/// University of a user as decided by their email domain.
async fn email_university_id(
    txn: &DatabaseTransaction,
    user: &user::Model,
) -> AppResult<Option<String>> {
    let Some((_, domain)) = split_email(&user.email) else {
        return Ok(None);
    };
    Ok(UniversityRepository::resolve_for_domain_in(txn, domain)
        .await?
        .map(|u| u.id))
}

async fn university_count(
    txn: &DatabaseTransaction,
    course_ids: &BTreeSet<String>,
) -> AppResult<usize> {
    if course_ids.is_empty() {
        return Ok(0);
    }
    let ids =
        ModuleRepository::university_ids_of_courses_in(txn, course_ids.iter().cloned()).await?;
    Ok(ids.len())
}

/// Hook 1: a non-staff user cannot be left without courses.
struct EnrolledCoursesNotEmpty;

#[async_trait]
impl RelationHook for EnrolledCoursesNotEmpty {
    async fn check(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        if !change.resulting.is_empty() {
            return Ok(());
        }
        let user = load_user(txn, &change.owner_id).await?;
        if user.is_staff {
            return Ok(());
        }
        Err(AppError::Integrity(format!(
            "Cannot remove all courses from non-staff user {}: enrolled_course_set cannot be empty",
            user.email
        )))
    }
}

/// Hook 2: removing users from a course cannot leave a non-staff user
/// without courses.
struct EnrolledUsersKeepACourse;

#[async_trait]
impl RelationHook for EnrolledUsersKeepACourse {
    async fn check(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        let course_id = &change.owner_id;
        let users =
            UserRepository::find_by_ids_in(txn, change.affected.iter().cloned()).await?;

        for user in users.into_iter().filter(|u| !u.is_staff) {
            let courses =
                RelationAccessor::ids_in(txn, Relation::UserEnrolledCourses, &user.id).await?;
            if courses.iter().all(|id| id == course_id) {
                return Err(AppError::Integrity(format!(
                    "Cannot remove non-staff user {} from course {course_id}: \
                     it is their only enrolled course",
                    user.email
                )));
            }
        }
        Ok(())
    }
}

/// Hook 3: a module cannot be left without courses.
struct ModuleCoursesNotEmpty;

#[async_trait]
impl RelationHook for ModuleCoursesNotEmpty {
    async fn check(&self, _txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        if change.resulting.is_empty() {
            return Err(AppError::Integrity(format!(
                "Cannot remove all courses from module {}: course_set cannot be empty",
                change.owner_id
            )));
        }
        Ok(())
    }
}

/// Hook 4: removing modules from a course cannot leave a module without
/// courses.
struct ModulesKeepACourse;

#[async_trait]
impl RelationHook for ModulesKeepACourse {
    async fn check(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        let course_id = &change.owner_id;
        for module_id in &change.affected {
            let courses =
                RelationAccessor::ids_in(txn, Relation::ModuleCourses, module_id).await?;
            if courses.iter().all(|id| id == course_id) {
                return Err(AppError::Integrity(format!(
                    "Cannot remove module {module_id} from course {course_id}: \
                     it is the module's only course"
                )));
            }
        }
        Ok(())
    }
}

/// Hook 5: enrolments stay within the university of the user's email domain.
///
/// The university always comes from the email domain, never from the
/// courses being added. A user whose domain resolves to no university
/// (staff) may still only hold courses of a single university.
struct EnrolmentMatchesUniversity;

impl EnrolmentMatchesUniversity {
    async fn check_user(
        txn: &DatabaseTransaction,
        user: &user::Model,
        added: &BTreeSet<String>,
        resulting: &BTreeSet<String>,
    ) -> AppResult<()> {
        match email_university_id(txn, user).await? {
            Some(university_id) => {
                let foreign: Vec<String> =
                    CourseRepository::find_by_ids_in(txn, added.iter().cloned())
                        .await?
                        .into_iter()
                        .filter(|c| c.university_id != university_id)
                        .map(|c| c.id)
                        .collect();

                if foreign.is_empty() {
                    Ok(())
                } else {
                    Err(AppError::Integrity(format!(
                        "Cannot enrol user {} in courses {}: \
                         they are not at the user's university",
                        user.email,
                        foreign.join(", ")
                    )))
                }
            }
            None => {
                if university_count(txn, resulting).await? > 1 {
                    Err(AppError::Integrity(format!(
                        "Cannot enrol user {} in courses across multiple universities",
                        user.email
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[async_trait]
impl RelationHook for EnrolmentMatchesUniversity {
    async fn check(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        match change.relation {
            Relation::UserEnrolledCourses => {
                let user = load_user(txn, &change.owner_id).await?;
                Self::check_user(txn, &user, &change.affected, &change.resulting).await
            }
            Relation::CourseEnrolledUsers => {
                let course_id = &change.owner_id;
                let added = BTreeSet::from([course_id.clone()]);

                for user_id in &change.affected {
                    let user = load_user(txn, user_id).await?;
                    let mut resulting =
                        RelationAccessor::ids_in(txn, Relation::UserEnrolledCourses, user_id)
                            .await?;
                    resulting.insert(course_id.clone());
                    Self::check_user(txn, &user, &added, &resulting).await?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Hook 6: the courses of a module span exactly one university.
struct ModuleSpansOneUniversity;

impl ModuleSpansOneUniversity {
    async fn check_module(
        txn: &DatabaseTransaction,
        module_id: &str,
        resulting: &BTreeSet<String>,
    ) -> AppResult<()> {
        if university_count(txn, resulting).await? > 1 {
            return Err(AppError::Integrity(format!(
                "Cannot link module {module_id} to courses across multiple universities"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RelationHook for ModuleSpansOneUniversity {
    async fn check(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        match change.relation {
            Relation::ModuleCourses => {
                Self::check_module(txn, &change.owner_id, &change.resulting).await
            }
            Relation::CourseModules => {
                for module_id in &change.affected {
                    let mut resulting =
                        RelationAccessor::ids_in(txn, Relation::ModuleCourses, module_id).await?;
                    resulting.insert(change.owner_id.clone());
                    Self::check_module(txn, module_id, &resulting).await?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
