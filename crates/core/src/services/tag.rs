//! Tag service.

use ratemymodule_common::{AppResult, IdGenerator};
use ratemymodule_db::repositories::{TagKind, TagRecord, TagRepository, UserRepository};
use serde::Deserialize;
use validator::Validate;

use super::require_staff;
use crate::validation::FieldErrors;

/// Default number of autocomplete suggestions.
const AUTOCOMPLETE_LIMIT: u64 = 10;

/// Tag service for business logic.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating or renaming a tag.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TagInput {
    pub kind: TagKind,

    #[validate(length(min = 2, max = 60))]
    pub name: String,

    #[serde(default)]
    pub is_verified: bool,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository, user_repo: UserRepository) -> Self {
        Self {
            tag_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a tag. Names are unique across every tag variant, ignoring case.
    pub async fn create(&self, input: TagInput) -> AppResult<TagRecord> {
        let name = input.name.trim().to_string();
        self.validate(&input, &name, None).await?;

        let tag = self
            .tag_repo
            .create(input.kind, self.id_gen.generate(), name, input.is_verified)
            .await?;
        tracing::info!(tag_id = %tag.id, kind = %tag.kind, name = %tag.name, "Created tag");
        Ok(tag)
    }

    /// Rename a tag or change its verification flag.
    pub async fn update(&self, id: &str, input: TagInput) -> AppResult<TagRecord> {
        self.tag_repo.get_by_id(input.kind, id).await?;
        let name = input.name.trim().to_string();
        self.validate(&input, &name, Some(id)).await?;

        self.tag_repo
            .update(input.kind, id, name, input.is_verified)
            .await
    }

    /// Mark a tag as verified. Staff only.
    pub async fn verify(&self, actor_id: &str, kind: TagKind, id: &str) -> AppResult<TagRecord> {
        require_staff(&self.user_repo, actor_id).await?;
        let tag = self.tag_repo.get_by_id(kind, id).await?;

        self.tag_repo.update(kind, id, tag.name, true).await
    }

    /// Get a tag by variant and ID.
    pub async fn get(&self, kind: TagKind, id: &str) -> AppResult<TagRecord> {
        self.tag_repo.get_by_id(kind, id).await
    }

    /// List tags of one variant.
    pub async fn list(&self, kind: TagKind) -> AppResult<Vec<TagRecord>> {
        self.tag_repo.list(kind).await
    }

    /// Suggest verified tags whose name contains `term`.
    pub async fn autocomplete(
        &self,
        kind: TagKind,
        term: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<TagRecord>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.tag_repo
            .autocomplete(kind, term, limit.unwrap_or(AUTOCOMPLETE_LIMIT))
            .await
    }

    /// Delete a tag.
    pub async fn delete(&self, kind: TagKind, id: &str) -> AppResult<()> {
        self.tag_repo.get_by_id(kind, id).await?;
        self.tag_repo.delete(kind, id).await
    }

    async fn validate(&self, input: &TagInput, name: &str, exclude_id: Option<&str>) -> AppResult<()> {
        let mut errors = FieldErrors::from_validate(input);

        if !errors.has("name") {
            let clashes = self
                .tag_repo
                .find_by_name_ignoring_case(name)
                .await?
                .into_iter()
                .any(|t| !(t.kind == input.kind && exclude_id == Some(t.id.as_str())));
            if clashes {
                errors.add("name", "unique", "A tag with that name already exists.");
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ratemymodule_common::AppError;
    use ratemymodule_db::entities::{topic_tag, user};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_service(db: MockDatabase) -> TagService {
        let db = Arc::new(db.into_connection());
        TagService::new(TagRepository::new(db.clone()), UserRepository::new(db))
    }

    fn topic(id: &str, name: &str) -> topic_tag::Model {
        topic_tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            is_verified: false,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_user(is_staff: bool) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            email: "a@bham.ac.uk".to_string(),
            password_hash: "hash".to_string(),
            is_staff,
            is_superuser: false,
            is_active: true,
            last_login: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_name_unique_across_variants() {
        // Lookup order: tool, topic, other.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<topic_tag::Model>::new()])
            .append_query_results([[topic("t1", "Python")]])
            .append_query_results([Vec::<topic_tag::Model>::new()]);
        let service = create_service(db);

        let err = service
            .create(TagInput {
                kind: TagKind::Tool,
                name: "python".to_string(),
                is_verified: false,
            })
            .await
            .unwrap_err();

        assert!(err.has_field_error("name"));
    }

    #[tokio::test]
    async fn test_short_name_skips_lookup() {
        let service = create_service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = service
            .create(TagInput {
                kind: TagKind::Other,
                name: "x".to_string(),
                is_verified: false,
            })
            .await
            .unwrap_err();

        assert!(err.has_field_error("name"));
    }

    #[tokio::test]
    async fn test_verify_requires_staff() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(false)]]);
        let service = create_service(db);

        let result = service.verify("user1", TagKind::Topic, "t1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_blank_autocomplete() {
        let service = create_service(MockDatabase::new(DatabaseBackend::Postgres));

        let tags = service.autocomplete(TagKind::Tool, "  ", None).await.unwrap();
        assert!(tags.is_empty());
    }
}
