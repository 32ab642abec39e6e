//! Dweet endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, FixedOffset};
use dwitter_common::AppResult;
use dwitter_core::CreateDweetInput;
use dwitter_db::entities::dweet;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create dweet request.
#[derive(Debug, Deserialize)]
pub struct CreateDweetRequest {
    pub body: String,
}

/// Request naming the author profile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDweetsRequest {
    pub profile_id: String,
}

/// Request naming one dweet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDweetRequest {
    pub dweet_id: String,
}

/// Dweet response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DweetResponse {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<dweet::Model> for DweetResponse {
    fn from(d: dweet::Model) -> Self {
        Self {
            id: d.id,
            author_id: d.author_id,
            body: d.body,
            created_at: d.created_at,
        }
    }
}

/// Post a dweet as the caller.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateDweetRequest>,
) -> AppResult<ApiResponse<DweetResponse>> {
    let dweet = state
        .dweet_service
        .post(&user.id, CreateDweetInput { body: req.body })
        .await?;

    Ok(ApiResponse::ok(dweet.into()))
}

/// Show one dweet.
async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowDweetRequest>,
) -> AppResult<ApiResponse<DweetResponse>> {
    let dweet = state.dweet_service.get(&req.dweet_id).await?;
    Ok(ApiResponse::ok(dweet.into()))
}

/// Dweets of one profile, newest first.
async fn user_dweets(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserDweetsRequest>,
) -> AppResult<ApiResponse<Vec<DweetResponse>>> {
    let dweets = state.dweet_service.list_by_author(&req.profile_id).await?;
    Ok(ApiResponse::ok(dweets.into_iter().map(Into::into).collect()))
}

/// Dweet routes, nested under `/dweets`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/user", post(user_dweets))
}
