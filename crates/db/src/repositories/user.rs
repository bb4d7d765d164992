//! User repository.

use std::sync::Arc;

use crate::entities::{user, User};
use crate::map_write_err;
use chrono::Utc;
use ratemymodule_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a user by ID through any connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    /// Find users by ID through any connection.
    pub async fn find_by_ids_in<C: ConnectionTrait>(
        conn: &C,
        ids: impl IntoIterator<Item = String>,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Id.is_in(ids))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by exact email address.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users whose address has the given local part, under any domain.
    ///
    /// Callers narrow the result by domain.
    pub async fn find_by_local_part(&self, local: &str) -> AppResult<Vec<user::Model>> {
        let prefix = format!("{local}@");
        let users = User::find()
            .filter(user::Column::Email.starts_with(&prefix))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // LIKE treats `_` and `%` as wildcards.
        Ok(users
            .into_iter()
            .filter(|u| u.email.starts_with(&prefix))
            .collect())
    }

    /// List users ordered by email.
    pub async fn list(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::Email)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a user through any connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: user::ActiveModel,
    ) -> AppResult<user::Model> {
        model.insert(conn).await.map_err(map_write_err)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        Self::update_in(self.db.as_ref(), model).await
    }

    /// Update a user through any connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: user::ActiveModel,
    ) -> AppResult<user::Model> {
        model.update(conn).await.map_err(map_write_err)
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: &str) -> AppResult<user::Model> {
        let user = self.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now().into()));
        self.update(active).await
    }

    /// Delete a user. Posts, reports and join rows go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
