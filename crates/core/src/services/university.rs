//! University service.

use chrono::{NaiveDate, Utc};
use ratemymodule_common::{AppResult, IdGenerator};
use ratemymodule_db::{entities::university, repositories::UniversityRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::validation::{is_valid_domain, FieldErrors};

/// University service for business logic.
#[derive(Clone)]
pub struct UniversityService {
    university_repo: UniversityRepository,
    id_gen: IdGenerator,
}

/// Input for creating or updating a university.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UniversityInput {
    #[validate(length(min = 2, max = 60))]
    pub name: String,

    #[validate(length(min = 2, max = 5))]
    pub short_name: String,

    /// Domain that student addresses fall under, e.g. `bham.ac.uk`.
    pub email_domain: String,

    pub founding_date: NaiveDate,
}

impl UniversityService {
    /// Create a new university service.
    #[must_use]
    pub const fn new(university_repo: UniversityRepository) -> Self {
        Self {
            university_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a university.
    pub async fn create(&self, input: UniversityInput) -> AppResult<university::Model> {
        let email_domain = input.email_domain.trim().to_lowercase();
        self.validate(&input, &email_domain, None).await?;

        let model = university::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            short_name: Set(input.short_name),
            email_domain: Set(email_domain),
            founding_date: Set(input.founding_date),
            created_at: Set(Utc::now().into()),
        };

        let university = self.university_repo.create(model).await?;
        tracing::info!(university_id = %university.id, domain = %university.email_domain, "Created university");
        Ok(university)
    }

    /// Update a university.
    pub async fn update(&self, id: &str, input: UniversityInput) -> AppResult<university::Model> {
        let university = self.university_repo.get_by_id(id).await?;
        let email_domain = input.email_domain.trim().to_lowercase();
        self.validate(&input, &email_domain, Some(id)).await?;

        let mut active: university::ActiveModel = university.into();
        active.name = Set(input.name);
        active.short_name = Set(input.short_name);
        active.email_domain = Set(email_domain);
        active.founding_date = Set(input.founding_date);

        self.university_repo.update(active).await
    }

    /// Get a university by ID.
    pub async fn get(&self, id: &str) -> AppResult<university::Model> {
        self.university_repo.get_by_id(id).await
    }

    /// List universities.
    pub async fn list(&self) -> AppResult<Vec<university::Model>> {
        self.university_repo.list().await
    }

    /// Delete a university. Fails with an integrity error while it has courses.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.university_repo.get_by_id(id).await?;
        self.university_repo.delete(id).await
    }

    async fn validate(
        &self,
        input: &UniversityInput,
        email_domain: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<()> {
        let mut errors = FieldErrors::from_validate(input);

        if !is_valid_domain(email_domain) {
            errors.add("email_domain", "invalid", "Enter a valid domain name.");
        } else if self
            .university_repo
            .find_by_email_domain(email_domain)
            .await?
            .is_some_and(|u| exclude_id != Some(u.id.as_str()))
        {
            errors.add(
                "email_domain",
                "unique",
                "A University with that Email Domain already exists.",
            );
        }

        if !errors.has("name")
            && self
                .university_repo
                .find_by_name(&input.name)
                .await?
                .is_some_and(|u| exclude_id != Some(u.id.as_str()))
        {
            errors.add("name", "unique", "A University with that Name already exists.");
        }

        errors.into_result()
    }
}
