//! Many-to-many relation accessor with change hooks.
//!
//! Every mutation of a join table goes through [`RelationAccessor`]. Before
//! anything is written the hooks registered for the `(relation, change kind)`
//! pair are run inside the same transaction; the first hook error aborts the
//! whole mutation and the transaction is rolled back.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use tracing::{debug, warn};

/// A many-to-many relation, named from the owning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `User.enrolled_course_set`
    UserEnrolledCourses,
    /// `Course.enrolled_user_set`
    CourseEnrolledUsers,
    /// `Module.course_set`
    ModuleCourses,
    /// `Course.module_set`
    CourseModules,
    /// `User.liked_post_set`
    UserLikedPosts,
    /// `Post.liked_user_set`
    PostLikedUsers,
    /// `User.disliked_post_set`
    UserDislikedPosts,
    /// `Post.disliked_user_set`
    PostDislikedUsers,
    /// `Post.tool_tag_set`
    PostToolTags,
    /// `Post.topic_tag_set`
    PostTopicTags,
    /// `Post.other_tag_set`
    PostOtherTags,
}

impl Relation {
    /// Join table backing this relation.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::UserEnrolledCourses | Self::CourseEnrolledUsers => "user_enrolled_course",
            Self::ModuleCourses | Self::CourseModules => "module_course",
            Self::UserLikedPosts | Self::PostLikedUsers => "user_liked_post",
            Self::UserDislikedPosts | Self::PostDislikedUsers => "user_disliked_post",
            Self::PostToolTags => "post_tool_tag",
            Self::PostTopicTags => "post_topic_tag",
            Self::PostOtherTags => "post_other_tag",
        }
    }

    /// Join column holding the owner's id.
    #[must_use]
    pub const fn owner_column(self) -> &'static str {
        match self {
            Self::UserEnrolledCourses | Self::UserLikedPosts | Self::UserDislikedPosts => {
                "user_id"
            }
            Self::CourseEnrolledUsers | Self::CourseModules => "course_id",
            Self::ModuleCourses => "module_id",
            Self::PostLikedUsers
            | Self::PostDislikedUsers
            | Self::PostToolTags
            | Self::PostTopicTags
            | Self::PostOtherTags => "post_id",
        }
    }

    /// Join column holding the related ids.
    #[must_use]
    pub const fn target_column(self) -> &'static str {
        match self {
            Self::UserEnrolledCourses | Self::ModuleCourses => "course_id",
            Self::CourseEnrolledUsers | Self::PostLikedUsers | Self::PostDislikedUsers => {
                "user_id"
            }
            Self::CourseModules => "module_id",
            Self::UserLikedPosts | Self::UserDislikedPosts => "post_id",
            Self::PostToolTags | Self::PostTopicTags | Self::PostOtherTags => "tag_id",
        }
    }

    /// Field name of the relation on its owner, used in error messages.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::UserEnrolledCourses => "enrolled_course_set",
            Self::CourseEnrolledUsers => "enrolled_user_set",
            Self::ModuleCourses => "course_set",
            Self::CourseModules => "module_set",
            Self::UserLikedPosts => "liked_post_set",
            Self::PostLikedUsers => "liked_user_set",
            Self::UserDislikedPosts => "disliked_post_set",
            Self::PostDislikedUsers => "disliked_user_set",
            Self::PostToolTags => "tool_tag_set",
            Self::PostTopicTags => "topic_tag_set",
            Self::PostOtherTags => "other_tag_set",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Kind of change about to be applied to a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
    Clear,
}

/// A pending relation change, handed to hooks before it is written.
#[derive(Debug, Clone)]
pub struct RelationChange {
    pub relation: Relation,
    pub kind: ChangeKind,
    /// Id of the owning row.
    pub owner_id: String,
    /// Ids being added or removed. For `Clear` this is every current id.
    pub affected: BTreeSet<String>,
    /// Related ids before the change.
    pub current: BTreeSet<String>,
    /// Related ids once the whole mutation has been applied.
    pub resulting: BTreeSet<String>,
}

/// A check run before a relation change is written.
#[async_trait]
pub trait RelationHook: Send + Sync {
    /// Return an error to veto the change.
    async fn check(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()>;
}

/// Hooks keyed by relation and change kind.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<(Relation, ChangeKind), Vec<Arc<dyn RelationHook>>>,
}

impl HookRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` for each of `kinds` on `relation`.
    pub fn register(
        &mut self,
        relation: Relation,
        kinds: &[ChangeKind],
        hook: Arc<dyn RelationHook>,
    ) -> &mut Self {
        for &kind in kinds {
            self.hooks
                .entry((relation, kind))
                .or_default()
                .push(Arc::clone(&hook));
        }
        self
    }

    /// Number of hooks registered for the pair.
    #[must_use]
    pub fn count(&self, relation: Relation, kind: ChangeKind) -> usize {
        self.hooks.get(&(relation, kind)).map_or(0, Vec::len)
    }

    async fn run(&self, txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        let Some(hooks) = self.hooks.get(&(change.relation, change.kind)) else {
            return Ok(());
        };

        for hook in hooks {
            if let Err(e) = hook.check(txn, change).await {
                warn!(
                    relation = %change.relation,
                    kind = ?change.kind,
                    owner_id = %change.owner_id,
                    error = %e,
                    "Relation change vetoed"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

fn collect_ids<I, S>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Transactional accessor for every many-to-many relation.
#[derive(Clone)]
pub struct RelationAccessor {
    db: Arc<DatabaseConnection>,
    hooks: Arc<HookRegistry>,
}

impl RelationAccessor {
    /// Create an accessor that runs `hooks` before every change.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, hooks: Arc<HookRegistry>) -> Self {
        Self { db, hooks }
    }

    /// Database connection used for standalone mutations.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Related ids of `owner_id`.
    pub async fn ids(&self, relation: Relation, owner_id: &str) -> AppResult<BTreeSet<String>> {
        Self::ids_in(self.db.as_ref(), relation, owner_id).await
    }

    /// Related ids of `owner_id`, read through any connection.
    pub async fn ids_in<C: ConnectionTrait>(
        conn: &C,
        relation: Relation,
        owner_id: &str,
    ) -> AppResult<BTreeSet<String>> {
        let query = Query::select()
            .column(Alias::new(relation.target_column()))
            .from(Alias::new(relation.table()))
            .and_where(Expr::col(Alias::new(relation.owner_column())).eq(owner_id))
            .to_owned();

        let rows = conn
            .query_all(conn.get_database_backend().build(&query))
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String>("", relation.target_column())
                    .map_err(db_err)
            })
            .collect()
    }

    /// Add `ids` to the relation. Ids already present are skipped.
    pub async fn add<I, S>(&self, relation: Relation, owner_id: &str, ids: I) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let txn = self.db.begin().await.map_err(db_err)?;
        self.add_in(&txn, relation, owner_id, ids).await?;
        txn.commit().await.map_err(db_err)
    }

    /// Remove `ids` from the relation.
    pub async fn remove<I, S>(&self, relation: Relation, owner_id: &str, ids: I) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let txn = self.db.begin().await.map_err(db_err)?;
        self.remove_in(&txn, relation, owner_id, ids).await?;
        txn.commit().await.map_err(db_err)
    }

    /// Remove every related id.
    pub async fn clear(&self, relation: Relation, owner_id: &str) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        self.clear_in(&txn, relation, owner_id).await?;
        txn.commit().await.map_err(db_err)
    }

    /// Replace the related ids with exactly `ids`.
    pub async fn set<I, S>(&self, relation: Relation, owner_id: &str, ids: I) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let txn = self.db.begin().await.map_err(db_err)?;
        self.set_in(&txn, relation, owner_id, ids).await?;
        txn.commit().await.map_err(db_err)
    }

    /// [`Self::add`] inside a caller-owned transaction.
    pub async fn add_in<I, S>(
        &self,
        txn: &DatabaseTransaction,
        relation: Relation,
        owner_id: &str,
        ids: I,
    ) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current = Self::ids_in(txn, relation, owner_id).await?;
        let affected: BTreeSet<String> = collect_ids(ids)
            .into_iter()
            .filter(|id| !current.contains(id))
            .collect();
        if affected.is_empty() {
            return Ok(());
        }

        let resulting = current.union(&affected).cloned().collect();
        let change = RelationChange {
            relation,
            kind: ChangeKind::Add,
            owner_id: owner_id.to_string(),
            affected,
            current,
            resulting,
        };
        self.hooks.run(txn, &change).await?;
        Self::insert_rows(txn, &change).await
    }

    /// [`Self::remove`] inside a caller-owned transaction.
    pub async fn remove_in<I, S>(
        &self,
        txn: &DatabaseTransaction,
        relation: Relation,
        owner_id: &str,
        ids: I,
    ) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current = Self::ids_in(txn, relation, owner_id).await?;
        let affected: BTreeSet<String> = collect_ids(ids)
            .into_iter()
            .filter(|id| current.contains(id))
            .collect();
        if affected.is_empty() {
            return Ok(());
        }

        let resulting = current.difference(&affected).cloned().collect();
        let change = RelationChange {
            relation,
            kind: ChangeKind::Remove,
            owner_id: owner_id.to_string(),
            affected,
            current,
            resulting,
        };
        self.hooks.run(txn, &change).await?;
        Self::delete_rows(txn, &change).await
    }

    /// [`Self::clear`] inside a caller-owned transaction.
    pub async fn clear_in(
        &self,
        txn: &DatabaseTransaction,
        relation: Relation,
        owner_id: &str,
    ) -> AppResult<()> {
        let current = Self::ids_in(txn, relation, owner_id).await?;
        let change = RelationChange {
            relation,
            kind: ChangeKind::Clear,
            owner_id: owner_id.to_string(),
            affected: current.clone(),
            current,
            resulting: BTreeSet::new(),
        };
        self.hooks.run(txn, &change).await?;
        if change.affected.is_empty() {
            return Ok(());
        }
        Self::delete_rows(txn, &change).await
    }

    /// [`Self::set`] inside a caller-owned transaction.
    ///
    /// Runs as a removal of the ids no longer wanted followed by an addition
    /// of the new ones. Both steps see the final set as `resulting`, so a
    /// replacement is not judged on the transient state in between.
    pub async fn set_in<I, S>(
        &self,
        txn: &DatabaseTransaction,
        relation: Relation,
        owner_id: &str,
        ids: I,
    ) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = collect_ids(ids);
        let current = Self::ids_in(txn, relation, owner_id).await?;

        let removed: BTreeSet<String> = current.difference(&target).cloned().collect();
        let added: BTreeSet<String> = target.difference(&current).cloned().collect();

        if !removed.is_empty() {
            let change = RelationChange {
                relation,
                kind: ChangeKind::Remove,
                owner_id: owner_id.to_string(),
                affected: removed,
                current: current.clone(),
                resulting: target.clone(),
            };
            self.hooks.run(txn, &change).await?;
            Self::delete_rows(txn, &change).await?;
        }

        if !added.is_empty() {
            let change = RelationChange {
                relation,
                kind: ChangeKind::Add,
                owner_id: owner_id.to_string(),
                affected: added,
                current: current.intersection(&target).cloned().collect(),
                resulting: target,
            };
            self.hooks.run(txn, &change).await?;
            Self::insert_rows(txn, &change).await?;
        }

        Ok(())
    }

    async fn insert_rows(txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        let relation = change.relation;
        let mut insert = Query::insert();
        insert.into_table(Alias::new(relation.table())).columns([
            Alias::new(relation.owner_column()),
            Alias::new(relation.target_column()),
        ]);
        for id in &change.affected {
            insert
                .values([change.owner_id.clone().into(), id.clone().into()])
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        txn.execute(txn.get_database_backend().build(&insert))
            .await
            .map_err(db_err)?;

        debug!(
            relation = %relation,
            owner_id = %change.owner_id,
            count = change.affected.len(),
            "Added related rows"
        );
        Ok(())
    }

    async fn delete_rows(txn: &DatabaseTransaction, change: &RelationChange) -> AppResult<()> {
        let relation = change.relation;
        let delete = Query::delete()
            .from_table(Alias::new(relation.table()))
            .and_where(Expr::col(Alias::new(relation.owner_column())).eq(change.owner_id.as_str()))
            .and_where(
                Expr::col(Alias::new(relation.target_column()))
                    .is_in(change.affected.iter().map(String::as_str)),
            )
            .to_owned();

        txn.execute(txn.get_database_backend().build(&delete))
            .await
            .map_err(db_err)?;

        debug!(
            relation = %relation,
            owner_id = %change.owner_id,
            kind = ?change.kind,
            count = change.affected.len(),
            "Removed related rows"
        );
        Ok(())
    }
}
