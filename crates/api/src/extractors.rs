//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use dwitter_common::AppError;
use dwitter_db::entities::user;

/// Authenticated user extractor.
///
/// Rejects the request with `401` unless the auth middleware resolved a
/// bearer token to a user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
