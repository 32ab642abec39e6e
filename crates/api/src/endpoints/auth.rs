//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use dwitter_common::AppResult;
use dwitter_core::RegisterInput;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
}

/// Signup response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: String,
    pub username: String,
    pub token: String,
    pub profile_id: String,
}

/// Create a new user account and its profile.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let (user, profile) = state
        .user_service
        .register(RegisterInput {
            username: req.username,
        })
        .await?;

    Ok(ApiResponse::ok(SignupResponse {
        id: user.id,
        username: user.username,
        token: user.token,
        profile_id: profile.id,
    }))
}

/// Signup routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/signup", post(signup))
}
