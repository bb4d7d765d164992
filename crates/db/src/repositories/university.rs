//! University repository.

use std::sync::Arc;

use crate::entities::{university, University};
use crate::map_write_err;
use ratemymodule_common::{domain_suffixes, AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// University repository for database operations.
#[derive(Clone)]
pub struct UniversityRepository {
    db: Arc<DatabaseConnection>,
}

impl UniversityRepository {
    /// Create a new university repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a university by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<university::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a university by ID through any connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<university::Model>> {
        University::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a university by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<university::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("University not found: {id}")))
    }

    /// Find a university by its name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<university::Model>> {
        University::find()
            .filter(university::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a university by its registered email domain.
    pub async fn find_by_email_domain(
        &self,
        domain: &str,
    ) -> AppResult<Option<university::Model>> {
        University::find()
            .filter(university::Column::EmailDomain.eq(domain.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve the university an email domain belongs to.
    pub async fn resolve_for_domain(&self, domain: &str) -> AppResult<Option<university::Model>> {
        Self::resolve_for_domain_in(self.db.as_ref(), domain).await
    }

    /// Resolve the university whose `email_domain` is the longest
    /// label-boundary suffix of `domain`, through any connection.
    ///
    /// `cs.bham.ac.uk` resolves to the university registered for
    /// `bham.ac.uk`; `notbham.ac.uk` does not.
    pub async fn resolve_for_domain_in<C: ConnectionTrait>(
        conn: &C,
        domain: &str,
    ) -> AppResult<Option<university::Model>> {
        let suffixes = domain_suffixes(domain);
        if suffixes.is_empty() {
            return Ok(None);
        }

        let candidates = University::find()
            .filter(university::Column::EmailDomain.is_in(suffixes.clone()))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(suffixes.iter().find_map(|suffix| {
            candidates
                .iter()
                .find(|u| u.email_domain.eq_ignore_ascii_case(suffix))
                .cloned()
        }))
    }

    /// List universities ordered by name.
    pub async fn list(&self) -> AppResult<Vec<university::Model>> {
        University::find()
            .order_by_asc(university::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new university.
    pub async fn create(&self, model: university::ActiveModel) -> AppResult<university::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a university.
    pub async fn update(&self, model: university::ActiveModel) -> AppResult<university::Model> {
        model.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Delete a university. Fails while any course still belongs to it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        University::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_write_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_university(id: &str, domain: &str) -> university::Model {
        university::Model {
            id: id.to_string(),
            name: format!("University {id}"),
            short_name: "UNI".to_string(),
            email_domain: domain.to_string(),
            founding_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_resolve_prefers_longest_suffix() {
        let outer = create_test_university("u1", "ac.uk");
        let inner = create_test_university("u2", "bham.ac.uk");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[outer, inner]])
                .into_connection(),
        );

        let repo = UniversityRepository::new(db);
        let result = repo.resolve_for_domain("cs.bham.ac.uk").await.unwrap();

        assert_eq!(result.unwrap().id, "u2");
    }

    #[tokio::test]
    async fn test_resolve_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<university::Model>::new()])
                .into_connection(),
        );

        let repo = UniversityRepository::new(db);
        let result = repo.resolve_for_domain("gmail.com").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_resolve_empty_domain_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UniversityRepository::new(db);
        assert!(repo.resolve_for_domain("").await.unwrap().is_none());
    }
}
