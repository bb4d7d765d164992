//! Post service.
//!
//! Every save re-runs the full validation and, in the same transaction,
//! leaves the author liking their own post.

use std::sync::Arc;

use chrono::Utc;
use ratemymodule_common::{error::NON_FIELD_ERRORS, AppError, AppResult, IdGenerator};
use ratemymodule_db::{
    entities::post,
    relations::{Relation, RelationAccessor},
    repositories::{ModuleRepository, PostFilter, PostRepository, TagKind, UserRepository},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set};
use serde::Deserialize;
use validator::Validate;

use super::{begin, commit, require_staff};
use crate::validation::FieldErrors;

/// Default page size for post listings.
const DEFAULT_LIMIT: u64 = 20;

/// Largest page size for post listings.
const MAX_LIMIT: u64 = 100;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    db: Arc<DatabaseConnection>,
    post_repo: PostRepository,
    module_repo: ModuleRepository,
    user_repo: UserRepository,
    relations: RelationAccessor,
    id_gen: IdGenerator,
}

/// Input for creating or updating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostInput {
    pub module_id: String,

    #[validate(range(min = 1, max = 5))]
    pub overall_rating: i16,

    #[validate(range(min = 1, max = 5))]
    pub difficulty_rating: Option<i16>,

    #[validate(range(min = 1, max = 5))]
    pub assessment_rating: Option<i16>,

    #[validate(range(min = 1, max = 5))]
    pub teaching_rating: Option<i16>,

    #[serde(default)]
    pub content: String,

    /// First calendar year of the academic year the module was taken in.
    #[validate(range(min = 1000, max = 3000))]
    pub academic_year_start: i16,

    #[serde(default)]
    pub tool_tag_ids: Vec<String>,

    #[serde(default)]
    pub topic_tag_ids: Vec<String>,

    #[serde(default)]
    pub other_tag_ids: Vec<String>,
}

impl PostInput {
    fn tag_ids(&self, kind: TagKind) -> &[String] {
        match kind {
            TagKind::Tool => &self.tool_tag_ids,
            TagKind::Topic => &self.topic_tag_ids,
            TagKind::Other => &self.other_tag_ids,
        }
    }
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, relations: RelationAccessor) -> Self {
        Self {
            post_repo: PostRepository::new(db.clone()),
            module_repo: ModuleRepository::new(db.clone()),
            user_repo: UserRepository::new(db.clone()),
            db,
            relations,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post by `user_id`.
    pub async fn create(&self, user_id: &str, input: PostInput) -> AppResult<post::Model> {
        self.user_repo.get_by_id(user_id).await?;
        self.validate(user_id, &input, None).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            module_id: Set(input.module_id.clone()),
            user_id: Set(user_id.to_string()),
            overall_rating: Set(input.overall_rating),
            difficulty_rating: Set(input.difficulty_rating),
            assessment_rating: Set(input.assessment_rating),
            teaching_rating: Set(input.teaching_rating),
            content: Set(input.content.clone()),
            academic_year_start: Set(input.academic_year_start),
            hidden: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let txn = begin(&self.db).await?;
        let post = PostRepository::create_in(&txn, model).await?;
        self.save_relations(&txn, &post, &input).await?;
        commit(txn).await?;

        tracing::info!(post_id = %post.id, module_id = %post.module_id, "Created post");
        Ok(post)
    }

    /// Update a post. Only its author may edit it.
    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        input: PostInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can edit a post".to_string(),
            ));
        }
        self.validate(user_id, &input, Some(post_id)).await?;

        let mut active: post::ActiveModel = post.into();
        active.module_id = Set(input.module_id.clone());
        active.overall_rating = Set(input.overall_rating);
        active.difficulty_rating = Set(input.difficulty_rating);
        active.assessment_rating = Set(input.assessment_rating);
        active.teaching_rating = Set(input.teaching_rating);
        active.content = Set(input.content.clone());
        active.academic_year_start = Set(input.academic_year_start);

        let txn = begin(&self.db).await?;
        let post = PostRepository::update_in(&txn, active).await?;
        self.save_relations(&txn, &post, &input).await?;
        commit(txn).await?;

        Ok(post)
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Get a post if the viewer may see it.
    pub async fn get_visible(&self, id: &str, viewer_is_staff: bool) -> AppResult<post::Model> {
        self.post_repo
            .find_viewable(id, viewer_is_staff)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post not found: {id}")))
    }

    /// List posts a viewer may see, newest first.
    pub async fn list(
        &self,
        filter: &PostFilter,
        viewer_is_staff: bool,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<post::Model>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        self.post_repo
            .list(filter, viewer_is_staff, limit, offset.unwrap_or(0))
            .await
    }

    /// Number of users liking a post.
    pub async fn liked_count(&self, id: &str) -> AppResult<u64> {
        self.post_repo.count_liked(id).await
    }

    /// Number of users disliking a post.
    pub async fn disliked_count(&self, id: &str) -> AppResult<u64> {
        self.post_repo.count_disliked(id).await
    }

    /// IDs of the tags of one variant on a post.
    pub async fn tag_ids(&self, id: &str, kind: TagKind) -> AppResult<Vec<String>> {
        Ok(self
            .relations
            .ids(kind.relation(), id)
            .await?
            .into_iter()
            .collect())
    }

    /// The student type of a post's author: that of the first course both
    /// teaching the module and attended by the author.
    pub async fn student_type(&self, id: &str) -> AppResult<String> {
        let post = self.post_repo.get_by_id(id).await?;
        self.post_repo
            .first_shared_course(&post.module_id, &post.user_id)
            .await?
            .map(|course| course.student_type)
            .ok_or_else(|| {
                AppError::NotFound(format!("No course links the author of post {id} to its module"))
            })
    }

    /// Hide a post from non-staff viewers. Staff only.
    pub async fn hide(&self, actor_id: &str, id: &str) -> AppResult<post::Model> {
        require_staff(&self.user_repo, actor_id).await?;
        let post = self.post_repo.set_hidden(id, true).await?;
        tracing::info!(post_id = %id, actor_id = %actor_id, "Hid post");
        Ok(post)
    }

    /// Make a hidden post visible again. Staff only.
    pub async fn unhide(&self, actor_id: &str, id: &str) -> AppResult<post::Model> {
        require_staff(&self.user_repo, actor_id).await?;
        let post = self.post_repo.set_hidden(id, false).await?;
        tracing::info!(post_id = %id, actor_id = %actor_id, "Unhid post");
        Ok(post)
    }

    /// Delete a post. Only its author or staff may delete it.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(id).await?;
        if post.user_id != actor_id {
            require_staff(&self.user_repo, actor_id).await?;
        }
        self.post_repo.delete(id).await
    }

    async fn validate(
        &self,
        user_id: &str,
        input: &PostInput,
        exclude_id: Option<&str>,
    ) -> AppResult<()> {
        let mut errors = FieldErrors::from_validate(input);

        if self.module_repo.find_by_id(&input.module_id).await?.is_none() {
            errors.add("module", "invalid", "Select a valid module.");
        } else if !self
            .module_repo
            .is_reachable_by_user(user_id, &input.module_id)
            .await?
        {
            errors.add(
                "module",
                "invalid",
                "You can only post about modules taught on courses you are enrolled in.",
            );
        } else if self
            .post_repo
            .find_by_user_and_module(user_id, &input.module_id)
            .await?
            .is_some_and(|p| exclude_id != Some(p.id.as_str()))
        {
            errors.add(
                NON_FIELD_ERRORS,
                "unique",
                "You have already made a post about this module.",
            );
        }

        errors.into_result()
    }

    /// Replace the tags and re-apply the author's own like.
    async fn save_relations(
        &self,
        txn: &DatabaseTransaction,
        post: &post::Model,
        input: &PostInput,
    ) -> AppResult<()> {
        for kind in TagKind::ALL {
            self.relations
                .set_in(txn, kind.relation(), &post.id, input.tag_ids(kind).to_vec())
                .await?;
        }

        self.relations
            .remove_in(txn, Relation::PostDislikedUsers, &post.id, [post.user_id.as_str()])
            .await?;
        self.relations
            .add_in(txn, Relation::PostLikedUsers, &post.id, [post.user_id.as_str()])
            .await
    }
}
