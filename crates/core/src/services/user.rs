//! User service.

use std::collections::BTreeSet;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use ratemymodule_common::config::RegistrationConfig;
use ratemymodule_common::{
    domain_name, normalize_email, split_email, AppError, AppResult, IdGenerator,
};
use ratemymodule_db::{
    entities::{university, user},
    relations::{Relation, RelationAccessor},
    repositories::{CourseRepository, PostRepository, UniversityRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use validator::Validate;

use super::{begin, commit};
use crate::validation::{check_email, FieldErrors};

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    university_repo: UniversityRepository,
    course_repo: CourseRepository,
    post_repo: PostRepository,
    relations: RelationAccessor,
    registration: RegistrationConfig,
    id_gen: IdGenerator,
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[serde(default)]
    pub is_staff: bool,

    #[serde(default)]
    pub is_superuser: bool,

    /// Courses to enrol in. Required unless the user is staff.
    #[serde(default)]
    pub course_ids: Vec<String>,
}

/// Input for self sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub course_ids: Vec<String>,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,

    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        relations: RelationAccessor,
        registration: RegistrationConfig,
    ) -> Self {
        Self {
            user_repo: UserRepository::new(db.clone()),
            university_repo: UniversityRepository::new(db.clone()),
            course_repo: CourseRepository::new(db.clone()),
            post_repo: PostRepository::new(db.clone()),
            db,
            relations,
            registration,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a user enrolled in `course_ids`.
    ///
    /// A superuser is always staff. Non-staff users need an address at a
    /// registered university and at least one course there.
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<user::Model> {
        let mut errors = FieldErrors::from_validate(&input);
        let email = normalize_email(&input.email);
        let is_staff = input.is_staff || input.is_superuser;

        let university = self
            .check_account(&email, None, is_staff, &mut errors)
            .await?;
        self.check_new_courses(&input.course_ids, is_staff, university.as_ref(), &mut errors)
            .await?;
        errors.into_result()?;

        let password_hash = hash_password(&input.password)?;
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email),
            password_hash: Set(password_hash),
            is_staff: Set(is_staff),
            is_superuser: Set(input.is_superuser),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let txn = begin(&self.db).await?;
        let user = UserRepository::create_in(&txn, model).await?;
        self.relations
            .add_in(&txn, Relation::UserEnrolledCourses, &user.id, input.course_ids)
            .await?;
        commit(txn).await?;

        tracing::info!(user_id = %user.id, is_staff = user.is_staff, "Created user");
        Ok(user)
    }

    /// Create a superuser, which is always staff.
    pub async fn create_superuser(&self, input: CreateUserInput) -> AppResult<user::Model> {
        self.create_user(CreateUserInput {
            is_staff: true,
            is_superuser: true,
            ..input
        })
        .await
    }

    /// Sign up a student.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        self.create_user(CreateUserInput {
            email: input.email,
            password: input.password,
            is_staff: false,
            is_superuser: false,
            course_ids: input.course_ids,
        })
        .await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// The university a user's email address belongs to, if any.
    pub async fn university(&self, id: &str) -> AppResult<Option<university::Model>> {
        let user = self.user_repo.get_by_id(id).await?;
        self.resolve_university(&user.email).await
    }

    /// Update a user, re-validating the whole account.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        let mut errors = FieldErrors::from_validate(&input);
        let user = self.user_repo.get_by_id(id).await?;

        let email = input
            .email
            .as_deref()
            .map_or_else(|| user.email.clone(), normalize_email);
        let is_superuser = input.is_superuser.unwrap_or(user.is_superuser);
        let is_staff = input.is_staff.unwrap_or(user.is_staff) || is_superuser;

        let university = self
            .check_account(&email, Some(id), is_staff, &mut errors)
            .await?;

        let enrolled = self.course_repo.find_enrolled(id).await?;
        if !is_staff && enrolled.is_empty() {
            errors.add(
                "enrolled_course_set",
                "required",
                "Non-staff users must be enrolled in at least one course.",
            );
        }
        let foreign = match &university {
            Some(university) => enrolled.iter().any(|c| c.university_id != university.id),
            None => enrolled
                .iter()
                .any(|c| c.university_id != enrolled[0].university_id),
        };
        if foreign {
            errors.add(
                "university",
                "invalid",
                "This user is linked to courses across multiple universities.",
            );
        }
        errors.into_result()?;

        let mut active: user::ActiveModel = user.into();
        active.email = Set(email);
        active.is_staff = Set(is_staff);
        active.is_superuser = Set(is_superuser);
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(password) = input.password {
            active.password_hash = Set(hash_password(&password)?);
        }

        self.user_repo.update(active).await
    }

    /// Replace the courses a user is enrolled in.
    pub async fn change_courses(&self, id: &str, course_ids: Vec<String>) -> AppResult<()> {
        self.user_repo.get_by_id(id).await?;
        self.require_courses(&course_ids).await?;

        self.relations
            .set(Relation::UserEnrolledCourses, id, course_ids)
            .await?;

        tracing::debug!(user_id = %id, "Changed enrolled courses");
        Ok(())
    }

    /// IDs of the courses a user is enrolled in.
    pub async fn enrolled_course_ids(&self, id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .relations
            .ids(Relation::UserEnrolledCourses, id)
            .await?
            .into_iter()
            .collect())
    }

    /// Like a post, dropping any dislike.
    pub async fn like_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        self.post_repo.get_by_id(post_id).await?;

        let txn = begin(&self.db).await?;
        self.relations
            .remove_in(&txn, Relation::UserDislikedPosts, user_id, [post_id])
            .await?;
        self.relations
            .add_in(&txn, Relation::UserLikedPosts, user_id, [post_id])
            .await?;
        commit(txn).await
    }

    /// Dislike a post, dropping any like. Authors cannot dislike their own post.
    pub async fn dislike_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.user_id == user_id {
            return Err(AppError::Forbidden(
                "You cannot dislike your own post".to_string(),
            ));
        }

        let txn = begin(&self.db).await?;
        self.relations
            .remove_in(&txn, Relation::UserLikedPosts, user_id, [post_id])
            .await?;
        self.relations
            .add_in(&txn, Relation::UserDislikedPosts, user_id, [post_id])
            .await?;
        commit(txn).await
    }

    /// Remove a like or dislike. Authors always like their own post.
    pub async fn unlike_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.user_id == user_id {
            return Err(AppError::Forbidden(
                "You cannot remove the like from your own post".to_string(),
            ));
        }

        let txn = begin(&self.db).await?;
        self.relations
            .remove_in(&txn, Relation::UserLikedPosts, user_id, [post_id])
            .await?;
        self.relations
            .remove_in(&txn, Relation::UserDislikedPosts, user_id, [post_id])
            .await?;
        commit(txn).await
    }

    /// IDs of the posts a user likes.
    pub async fn liked_post_ids(&self, id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .relations
            .ids(Relation::UserLikedPosts, id)
            .await?
            .into_iter()
            .collect())
    }

    /// IDs of the posts a user dislikes.
    pub async fn disliked_post_ids(&self, id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .relations
            .ids(Relation::UserDislikedPosts, id)
            .await?
            .into_iter()
            .collect())
    }

    /// Authenticate a user by email and password, recording the login.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let invalid = || AppError::Forbidden("Invalid email address or password".to_string());

        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !user.is_active || !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        self.user_repo.touch_last_login(&user.id).await
    }

    /// Delete an account with its posts, reports and relations.
    pub async fn delete_account(&self, id: &str) -> AppResult<()> {
        self.user_repo.get_by_id(id).await?;
        self.user_repo.delete(id).await?;

        tracing::info!(user_id = %id, "Deleted account");
        Ok(())
    }

    async fn resolve_university(&self, email: &str) -> AppResult<Option<university::Model>> {
        match split_email(email) {
            Some((_, domain)) => self.university_repo.resolve_for_domain(domain).await,
            None => Ok(None),
        }
    }

    /// Email rules, duplicate detection and university resolution.
    async fn check_account(
        &self,
        email: &str,
        exclude_id: Option<&str>,
        is_staff: bool,
        errors: &mut FieldErrors,
    ) -> AppResult<Option<university::Model>> {
        check_email(email, &self.registration, errors);
        if errors.has("email") {
            return Ok(None);
        }

        let university = self.resolve_university(email).await?;

        if self.is_duplicate_email(email, exclude_id).await? {
            errors.add(
                "email",
                "unique",
                "That Email Address is already in use by another user.",
            );
        }

        if !is_staff && university.is_none() {
            errors.add(
                "email",
                "invalid",
                "The domain of this email address does not belong to a registered university.",
            );
        }

        Ok(university)
    }

    /// Whether another user has the same local part under the same domain
    /// name, so `jo@bham.ac.uk` and `jo@cs.bham.ac.uk` collide in either
    /// order.
    async fn is_duplicate_email(&self, email: &str, exclude_id: Option<&str>) -> AppResult<bool> {
        let Some((local, domain)) = split_email(email) else {
            return Ok(false);
        };
        let name = domain_name(domain);

        Ok(self
            .user_repo
            .find_by_local_part(local)
            .await?
            .into_iter()
            .filter(|u| exclude_id != Some(u.id.as_str()))
            .any(|u| split_email(&u.email).is_some_and(|(_, d)| domain_name(d) == name)))
    }

    async fn check_new_courses(
        &self,
        course_ids: &[String],
        is_staff: bool,
        university: Option<&university::Model>,
        errors: &mut FieldErrors,
    ) -> AppResult<()> {
        if course_ids.is_empty() {
            if !is_staff {
                errors.add(
                    "enrolled_course_set",
                    "required",
                    "Non-staff users must be enrolled in at least one course.",
                );
            }
            return Ok(());
        }

        let wanted: BTreeSet<&str> = course_ids.iter().map(String::as_str).collect();
        let courses = self.course_repo.find_by_ids(course_ids.to_vec()).await?;
        if courses.len() != wanted.len() {
            errors.add(
                "enrolled_course_set",
                "invalid",
                "Select valid courses.",
            );
        }

        let foreign = match university {
            Some(university) => courses.iter().any(|c| c.university_id != university.id),
            None => courses
                .iter()
                .any(|c| c.university_id != courses[0].university_id),
        };
        if foreign {
            errors.add(
                "university",
                "invalid",
                "This user is linked to courses across multiple universities.",
            );
        }
        Ok(())
    }

    async fn require_courses(&self, course_ids: &[String]) -> AppResult<()> {
        let found = self.course_repo.find_by_ids(course_ids.to_vec()).await?;
        if let Some(missing) = course_ids
            .iter()
            .find(|id| !found.iter().any(|c| &c.id == *id))
        {
            return Err(AppError::NotFound(format!("Course not found: {missing}")));
        }
        Ok(())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
