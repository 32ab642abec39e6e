//! Dweet service.

use crate::services::graph::GraphService;
use dwitter_common::{AppError, AppResult, IdGenerator, monotonic_now};
use dwitter_db::{
    entities::dweet::{self, MAX_BODY_LENGTH},
    repositories::{DweetRepository, ProfileRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Input for creating a new dweet. The creation time is always assigned by
/// the service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDweetInput {
    #[validate(length(max = 140))]
    pub body: String,
}

/// Dweet service for business logic.
#[derive(Clone)]
pub struct DweetService {
    dweet_repo: DweetRepository,
    profile_repo: ProfileRepository,
    graph: GraphService,
    id_gen: IdGenerator,
}

impl DweetService {
    /// Create a new dweet service.
    #[must_use]
    pub fn new(
        dweet_repo: DweetRepository,
        profile_repo: ProfileRepository,
        graph: GraphService,
    ) -> Self {
        Self {
            dweet_repo,
            profile_repo,
            graph,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a dweet as a user, provisioning their profile if needed.
    pub async fn post(&self, user_id: &str, input: CreateDweetInput) -> AppResult<dweet::Model> {
        validate_body(&input)?;
        let profile = self.graph.ensure_profile(user_id).await?;
        self.insert(&profile.id, input.body).await
    }

    /// Create a dweet authored by an existing profile.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateDweetInput,
    ) -> AppResult<dweet::Model> {
        validate_body(&input)?;
        self.profile_repo.get_by_id(author_id).await?;
        self.insert(author_id, input.body).await
    }

    async fn insert(&self, author_id: &str, body: String) -> AppResult<dweet::Model> {
        let model = dweet::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            body: Set(body),
            created_at: Set(monotonic_now().into()),
        };

        let dweet = self.dweet_repo.create(model).await?;
        info!(dweet_id = %dweet.id, author_id = %author_id, "Created dweet");

        Ok(dweet)
    }

    /// Get a dweet by ID.
    pub async fn get(&self, id: &str) -> AppResult<dweet::Model> {
        self.dweet_repo.get_by_id(id).await
    }

    /// Dweets written by one profile, newest first.
    pub async fn list_by_author(&self, author_id: &str) -> AppResult<Vec<dweet::Model>> {
        self.profile_repo.get_by_id(author_id).await?;
        self.dweet_repo.find_by_author(author_id).await
    }

    /// Count dweets written by one profile.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.dweet_repo.count_by_author(author_id).await
    }
}

/// Reject blank bodies and bodies over [`MAX_BODY_LENGTH`] characters.
fn validate_body(input: &CreateDweetInput) -> AppResult<()> {
    input.validate()?;

    if input.body.trim().is_empty() {
        return Err(AppError::Validation(
            "Dweet body must not be empty".to_string(),
        ));
    }

    // Counted in characters, not bytes.
    if input.body.chars().count() > MAX_BODY_LENGTH {
        return Err(AppError::Validation(format!(
            "Dweet body must be at most {MAX_BODY_LENGTH} characters"
        )));
    }

    Ok(())
}
