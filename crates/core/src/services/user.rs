//! User service.
//!
//! A minimal identity provider: users are registered with a username and
//! receive an access token. Registering a user provisions their profile.

use chrono::Utc;
use dwitter_common::{AppError, AppResult, IdGenerator};
use dwitter_db::{
    entities::{profile, user},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::graph::GraphService;

/// Input for registering a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 32))]
    pub username: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    graph: GraphService,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, graph: GraphService) -> Self {
        Self {
            user_repo,
            graph,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user and provision their profile.
    pub async fn register(&self, input: RegisterInput) -> AppResult<(user::Model, profile::Model)> {
        input.validate()?;
        validate_username(&input.username)?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "username {}",
                input.username
            )));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            token: Set(self.id_gen.generate_token()),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = %user.id, username = %user.username, "Registered user");

        let profile = self.graph.ensure_profile(&user.id).await?;

        Ok((user, profile))
    }

    /// Resolve an access token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get users by IDs. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_by_ids(ids).await
    }
}

fn validate_username(username: &str) -> AppResult<()> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Username may only contain letters, digits and underscores".to_string(),
        ))
    }
}
