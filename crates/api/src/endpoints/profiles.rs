//! Profile endpoints.

use std::collections::HashMap;

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, FixedOffset};
use dwitter_common::AppResult;
use dwitter_core::ProfileStats;
use dwitter_db::entities::profile;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public view of a profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub created_at: DateTime<FixedOffset>,
}

/// A profile with its relation counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetailResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    #[serde(flatten)]
    pub stats: ProfileStats,
    pub dweets_count: u64,
    /// Whether the caller follows this profile.
    pub is_following: bool,
}

/// Request naming one profile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileIdRequest {
    pub profile_id: String,
}

/// Attach usernames to profiles, keeping their order.
pub(crate) async fn with_usernames(
    state: &AppState,
    profiles: Vec<profile::Model>,
) -> AppResult<Vec<ProfileResponse>> {
    let user_ids: Vec<String> = profiles.iter().map(|p| p.user_id.clone()).collect();
    let users = state.user_service.find_by_ids(&user_ids).await?;
    let usernames: HashMap<String, String> =
        users.into_iter().map(|u| (u.id, u.username)).collect();

    Ok(profiles
        .into_iter()
        .map(|p| ProfileResponse {
            username: usernames.get(&p.user_id).cloned().unwrap_or_default(),
            id: p.id,
            user_id: p.user_id,
            created_at: p.created_at,
        })
        .collect())
}

async fn detail(
    state: &AppState,
    viewer_profile_id: &str,
    profile: profile::Model,
) -> AppResult<ProfileDetailResponse> {
    let stats = state.graph_service.stats(&profile.id).await?;
    let is_following = state
        .graph_service
        .is_following(viewer_profile_id, &profile.id)
        .await?;
    let dweets_count = state.dweet_service.count_by_author(&profile.id).await?;
    let user = state.user_service.get(&profile.user_id).await?;

    Ok(ProfileDetailResponse {
        profile: ProfileResponse {
            id: profile.id,
            user_id: profile.user_id,
            username: user.username,
            created_at: profile.created_at,
        },
        stats,
        dweets_count,
        is_following,
    })
}

/// Get the caller's own profile, provisioning it on first sight.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfileDetailResponse>> {
    let profile = state.graph_service.ensure_profile(&user.id).await?;
    let viewer = profile.id.clone();
    Ok(ApiResponse::ok(detail(&state, &viewer, profile).await?))
}

/// Show one profile.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProfileIdRequest>,
) -> AppResult<ApiResponse<ProfileDetailResponse>> {
    let viewer = state.graph_service.ensure_profile(&user.id).await?;
    let profile = state.graph_service.get_profile(&req.profile_id).await?;
    Ok(ApiResponse::ok(detail(&state, &viewer.id, profile).await?))
}

/// List every profile except the caller's.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ProfileResponse>>> {
    let profiles = state.feed_service.list_profiles(&user.id).await?;
    Ok(ApiResponse::ok(with_usernames(&state, profiles).await?))
}

/// Profiles followed by a profile.
async fn following(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProfileIdRequest>,
) -> AppResult<ApiResponse<Vec<ProfileResponse>>> {
    let profiles = state.graph_service.get_following(&req.profile_id).await?;
    Ok(ApiResponse::ok(with_usernames(&state, profiles).await?))
}

/// Profiles following a profile.
async fn followers(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProfileIdRequest>,
) -> AppResult<ApiResponse<Vec<ProfileResponse>>> {
    let profiles = state.graph_service.get_followers(&req.profile_id).await?;
    Ok(ApiResponse::ok(with_usernames(&state, profiles).await?))
}

/// The `/i` route.
pub fn me_router() -> Router<AppState> {
    Router::new().route("/i", post(me))
}

/// Profile routes, nested under `/profiles`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/following", post(following))
        .route("/followers", post(followers))
}
