//! Following endpoints.

use axum::{Json, Router, extract::State, routing::post};
use dwitter_common::AppResult;
use dwitter_core::FollowResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Follow request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub profile_id: String,
}

/// Follow result response.
#[derive(Serialize)]
pub struct FollowResponse {
    pub status: FollowResult,
}

/// Unfollow result response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowResponse {
    /// False when there was no edge to remove.
    pub removed: bool,
}

/// Follow a profile.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let me = state.graph_service.ensure_profile(&user.id).await?;
    let status = state.graph_service.follow(&me.id, &req.profile_id).await?;

    Ok(ApiResponse::ok(FollowResponse { status }))
}

/// Unfollow a profile.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<UnfollowResponse>> {
    let me = state.graph_service.ensure_profile(&user.id).await?;
    let removed = state
        .graph_service
        .unfollow(&me.id, &req.profile_id)
        .await?;

    Ok(ApiResponse::ok(UnfollowResponse { removed }))
}

/// Following routes, nested under `/following`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(follow))
        .route("/delete", post(unfollow))
}
