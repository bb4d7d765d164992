//! Post repository.
//!
//! Holds the two scoped post queries: posts carrying any of a set of tag
//! names, and posts a viewer is allowed to see.

use std::sync::Arc;

use crate::entities::{
    course, module_course, other_tag, post, post_other_tag, post_tool_tag, post_topic_tag,
    report, tool_tag, topic_tag, user_disliked_post, user_enrolled_course, user_liked_post,
    Course, Post, UserDislikedPost, UserLikedPost,
};
use crate::map_write_err;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, Func, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::Deserialize;

/// Optional filters for post listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    /// Restrict to posts about this module.
    pub module_id: Option<String>,
    /// Case-insensitive substring of the content.
    pub q: Option<String>,
    /// Exact overall rating.
    pub rating: Option<i16>,
    /// Exact academic year start.
    pub year: Option<i16>,
    /// Posts carrying any of these tag names.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

fn tagged_post_ids<E, C>(join: E, post_col: C, tag_col: C, tag_ids: SelectStatement) -> SelectStatement
where
    E: EntityTrait,
    C: ColumnTrait,
{
    Query::select()
        .column(post_col)
        .from(join)
        .and_where(tag_col.in_subquery(tag_ids))
        .to_owned()
}

fn any_tag_condition(names: &[String]) -> Condition {
    let tool_ids = Query::select()
        .column(tool_tag::Column::Id)
        .from(tool_tag::Entity)
        .and_where(tool_tag::Column::Name.is_in(names.iter().cloned()))
        .to_owned();
    let topic_ids = Query::select()
        .column(topic_tag::Column::Id)
        .from(topic_tag::Entity)
        .and_where(topic_tag::Column::Name.is_in(names.iter().cloned()))
        .to_owned();
    let other_ids = Query::select()
        .column(other_tag::Column::Id)
        .from(other_tag::Entity)
        .and_where(other_tag::Column::Name.is_in(names.iter().cloned()))
        .to_owned();

    Condition::any()
        .add(post::Column::Id.in_subquery(tagged_post_ids(
            post_tool_tag::Entity,
            post_tool_tag::Column::PostId,
            post_tool_tag::Column::TagId,
            tool_ids,
        )))
        .add(post::Column::Id.in_subquery(tagged_post_ids(
            post_topic_tag::Entity,
            post_topic_tag::Column::PostId,
            post_topic_tag::Column::TagId,
            topic_ids,
        )))
        .add(post::Column::Id.in_subquery(tagged_post_ids(
            post_other_tag::Entity,
            post_other_tag::Column::PostId,
            post_other_tag::Column::TagId,
            other_ids,
        )))
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a post by ID through any connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post not found: {id}")))
    }

    /// Find the post a user made about a module.
    pub async fn find_by_user_and_module(
        &self,
        user_id: &str,
        module_id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .filter(post::Column::ModuleId.eq(module_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts carrying at least one tag, of any variant, named in `names`.
    #[must_use]
    pub fn with_any_tag(names: &[String]) -> Select<Post> {
        Post::find().filter(any_tag_condition(names))
    }

    /// Posts a viewer may see, optionally restricted to one module.
    ///
    /// Staff see everything. Everyone else never sees hidden posts or posts
    /// with an unsolved report.
    #[must_use]
    pub fn viewable(module_id: Option<&str>, viewer_is_staff: bool) -> Select<Post> {
        let mut query = Post::find();

        if let Some(module_id) = module_id {
            query = query.filter(post::Column::ModuleId.eq(module_id));
        }

        if !viewer_is_staff {
            let reported = Query::select()
                .column(report::Column::PostId)
                .from(report::Entity)
                .and_where(report::Column::IsSolved.eq(false))
                .to_owned();

            query = query
                .filter(post::Column::Hidden.eq(false))
                .filter(post::Column::Id.not_in_subquery(reported));
        }

        query
    }

    /// Find a post if the viewer may see it.
    pub async fn find_viewable(
        &self,
        id: &str,
        viewer_is_staff: bool,
    ) -> AppResult<Option<post::Model>> {
        Self::viewable(None, viewer_is_staff)
            .filter(post::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Viewable posts matching `filter`, newest first.
    #[must_use]
    pub fn filtered(filter: &PostFilter, viewer_is_staff: bool) -> Select<Post> {
        let mut query = Self::viewable(filter.module_id.as_deref(), viewer_is_staff);

        if !filter.tags.is_empty() {
            query = query.filter(any_tag_condition(&filter.tags));
        }
        if let Some(q) = filter.q.as_deref().filter(|q| !q.is_empty()) {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((post::Entity, post::Column::Content))))
                    .like(format!("%{}%", q.to_lowercase())),
            );
        }
        if let Some(rating) = filter.rating {
            query = query.filter(post::Column::OverallRating.eq(rating));
        }
        if let Some(year) = filter.year {
            query = query.filter(post::Column::AcademicYearStart.eq(year));
        }

        query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
    }

    /// List viewable posts matching `filter`, newest first.
    pub async fn list(
        &self,
        filter: &PostFilter,
        viewer_is_staff: bool,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        Self::filtered(filter, viewer_is_staff)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts about a module visible to non-staff viewers.
    pub async fn public_for_module(&self, module_id: &str) -> AppResult<Vec<post::Model>> {
        Self::viewable(Some(module_id), false)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of users that like a post.
    pub async fn count_liked(&self, post_id: &str) -> AppResult<u64> {
        UserLikedPost::find()
            .filter(user_liked_post::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of users that dislike a post.
    pub async fn count_disliked(&self, post_id: &str) -> AppResult<u64> {
        UserDislikedPost::find()
            .filter(user_disliked_post::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// First course (oldest) linked to the post's module that its author is
    /// enrolled in.
    pub async fn first_shared_course(
        &self,
        module_id: &str,
        user_id: &str,
    ) -> AppResult<Option<course::Model>> {
        let module_courses = Query::select()
            .column(module_course::Column::CourseId)
            .from(module_course::Entity)
            .and_where(module_course::Column::ModuleId.eq(module_id))
            .to_owned();
        let enrolled = Query::select()
            .column(user_enrolled_course::Column::CourseId)
            .from(user_enrolled_course::Entity)
            .and_where(user_enrolled_course::Column::UserId.eq(user_id))
            .to_owned();

        Course::find()
            .filter(course::Column::Id.in_subquery(module_courses))
            .filter(course::Column::Id.in_subquery(enrolled))
            .order_by_asc(course::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a post through any connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model.insert(conn).await.map_err(map_write_err)
    }

    /// Update a post through any connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model.update(conn).await.map_err(map_write_err)
    }

    /// Set the moderation flag of a post.
    pub async fn set_hidden(&self, id: &str, hidden: bool) -> AppResult<post::Model> {
        let post = self.get_by_id(id).await?;
        let mut active: post::ActiveModel = post.into();
        active.hidden = Set(hidden);
        Self::update_in(self.db.as_ref(), active).await
    }

    /// Delete a post. Reports and join rows go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
