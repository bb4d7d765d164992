//! Tag repository.
//!
//! Tool, topic and other tags live in three parallel tables with the same
//! shape. The repository presents them as one [`TagRecord`] type keyed by
//! [`TagKind`].

use std::fmt;
use std::sync::Arc;

use crate::entities::{other_tag, tool_tag, topic_tag, OtherTag, ToolTag, TopicTag};
use crate::map_write_err;
use crate::relations::Relation;
use chrono::Utc;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

/// Tag variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Tool,
    Topic,
    Other,
}

impl TagKind {
    /// Every variant.
    pub const ALL: [Self; 3] = [Self::Tool, Self::Topic, Self::Other];

    /// Relation from a post to tags of this variant.
    #[must_use]
    pub const fn relation(self) -> Relation {
        match self {
            Self::Tool => Relation::PostToolTags,
            Self::Topic => Relation::PostTopicTags,
            Self::Other => Relation::PostOtherTags,
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tool => "tool tag",
            Self::Topic => "topic tag",
            Self::Other => "other tag",
        })
    }
}

/// A tag of any variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub kind: TagKind,
    pub id: String,
    pub name: String,
    pub is_verified: bool,
    pub created_at: DateTimeWithTimeZone,
}

macro_rules! impl_from_tag_model {
    ($module:ident, $kind:expr) => {
        impl From<$module::Model> for TagRecord {
            fn from(model: $module::Model) -> Self {
                Self {
                    kind: $kind,
                    id: model.id,
                    name: model.name,
                    is_verified: model.is_verified,
                    created_at: model.created_at,
                }
            }
        }
    };
}

impl_from_tag_model!(tool_tag, TagKind::Tool);
impl_from_tag_model!(topic_tag, TagKind::Topic);
impl_from_tag_model!(other_tag, TagKind::Other);

/// Run `$body` with `$entity`/`$module` bound to the table for `$kind`.
macro_rules! with_tag_table {
    ($kind:expr, |$entity:ident, $module:ident| $body:expr) => {
        match $kind {
            TagKind::Tool => {
                #[allow(unused_imports)]
                use tool_tag as $module;
                #[allow(dead_code)]
                type $entity = ToolTag;
                $body
            }
            TagKind::Topic => {
                #[allow(unused_imports)]
                use topic_tag as $module;
                #[allow(dead_code)]
                type $entity = TopicTag;
                $body
            }
            TagKind::Other => {
                #[allow(unused_imports)]
                use other_tag as $module;
                #[allow(dead_code)]
                type $entity = OtherTag;
                $body
            }
        }
    };
}

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tag by variant and ID.
    pub async fn find_by_id(&self, kind: TagKind, id: &str) -> AppResult<Option<TagRecord>> {
        with_tag_table!(kind, |Table, table| {
            Table::find_by_id(id)
                .one(self.db.as_ref())
                .await
                .map(|found| found.map(TagRecord::from))
                .map_err(|e| AppError::Database(e.to_string()))
        })
    }

    /// Get a tag by variant and ID, returning an error if not found.
    pub async fn get_by_id(&self, kind: TagKind, id: &str) -> AppResult<TagRecord> {
        self.find_by_id(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{kind} not found: {id}")))
    }

    /// Tags of any variant whose name equals `name`, ignoring case.
    pub async fn find_by_name_ignoring_case(&self, name: &str) -> AppResult<Vec<TagRecord>> {
        let lowered = name.to_lowercase();
        let mut found = Vec::new();

        for kind in TagKind::ALL {
            let tags: Vec<TagRecord> = with_tag_table!(kind, |Table, table| {
                Table::find()
                    .filter(
                        Expr::expr(Func::lower(Expr::col(table::Column::Name)))
                            .eq(lowered.as_str()),
                    )
                    .all(self.db.as_ref())
                    .await
                    .map(|models| models.into_iter().map(TagRecord::from).collect())
                    .map_err(|e| AppError::Database(e.to_string()))
            })?;
            found.extend(tags);
        }

        Ok(found)
    }

    /// Tags of one variant with the given exact names.
    pub async fn find_by_names(&self, kind: TagKind, names: &[String]) -> AppResult<Vec<TagRecord>> {
        with_tag_table!(kind, |Table, table| {
            Table::find()
                .filter(table::Column::Name.is_in(names.iter().cloned()))
                .all(self.db.as_ref())
                .await
                .map(|models| models.into_iter().map(TagRecord::from).collect())
                .map_err(|e| AppError::Database(e.to_string()))
        })
    }

    /// Verified tags whose name contains `term`, ignoring case.
    pub async fn autocomplete(
        &self,
        kind: TagKind,
        term: &str,
        limit: u64,
    ) -> AppResult<Vec<TagRecord>> {
        let pattern = format!("%{}%", term.to_lowercase());
        with_tag_table!(kind, |Table, table| {
            Table::find()
                .filter(table::Column::IsVerified.eq(true))
                .filter(Expr::expr(Func::lower(Expr::col(table::Column::Name))).like(pattern.as_str()))
                .order_by_asc(table::Column::Name)
                .limit(limit)
                .all(self.db.as_ref())
                .await
                .map(|models| models.into_iter().map(TagRecord::from).collect())
                .map_err(|e| AppError::Database(e.to_string()))
        })
    }

    /// List tags of one variant ordered by name.
    pub async fn list(&self, kind: TagKind) -> AppResult<Vec<TagRecord>> {
        with_tag_table!(kind, |Table, table| {
            Table::find()
                .order_by_asc(table::Column::Name)
                .all(self.db.as_ref())
                .await
                .map(|models| models.into_iter().map(TagRecord::from).collect())
                .map_err(|e| AppError::Database(e.to_string()))
        })
    }

    /// Insert a new tag.
    pub async fn create(
        &self,
        kind: TagKind,
        id: String,
        name: String,
        is_verified: bool,
    ) -> AppResult<TagRecord> {
        with_tag_table!(kind, |Table, table| {
            table::ActiveModel {
                id: Set(id),
                name: Set(name),
                is_verified: Set(is_verified),
                created_at: Set(Utc::now().into()),
            }
            .insert(self.db.as_ref())
            .await
            .map(TagRecord::from)
            .map_err(map_write_err)
        })
    }

    /// Change a tag's name and verification flag.
    pub async fn update(
        &self,
        kind: TagKind,
        id: &str,
        name: String,
        is_verified: bool,
    ) -> AppResult<TagRecord> {
        with_tag_table!(kind, |Table, table| {
            let model = Table::find_by_id(id)
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| AppError::NotFound(format!("{kind} not found: {id}")))?;

            let mut active: table::ActiveModel = model.into();
            active.name = Set(name);
            active.is_verified = Set(is_verified);
            active
                .update(self.db.as_ref())
                .await
                .map(TagRecord::from)
                .map_err(map_write_err)
        })
    }

    /// Delete a tag. Its links to posts go with it.
    pub async fn delete(&self, kind: TagKind, id: &str) -> AppResult<()> {
        with_tag_table!(kind, |Table, table| {
            Table::delete_by_id(id)
                .exec(self.db.as_ref())
                .await
                .map(|_| ())
                .map_err(|e| AppError::Database(e.to_string()))
        })
    }
}
