//! Feed endpoint.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, FixedOffset};
use dwitter_common::AppResult;
use dwitter_core::{FeedCursor, FeedItem, FeedQuery};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Feed request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub limit: Option<u64>,
    /// Cursor returned by the previous page.
    pub cursor: Option<String>,
}

/// One feed entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemResponse {
    pub id: String,
    pub author_id: String,
    pub author_display_name: String,
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<FeedItem> for FeedItemResponse {
    fn from(item: FeedItem) -> Self {
        Self {
            id: item.dweet.id,
            author_id: item.dweet.author_id,
            author_display_name: item.author_display_name,
            body: item.dweet.body,
            created_at: item.dweet.created_at,
        }
    }
}

/// Feed page response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub items: Vec<FeedItemResponse>,
    pub next_cursor: Option<String>,
}

/// The caller's feed, newest first.
async fn feed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FeedRequest>,
) -> AppResult<ApiResponse<FeedResponse>> {
    let before = req.cursor.as_deref().map(FeedCursor::decode).transpose()?;
    let limit = req
        .limit
        .unwrap_or(state.feed_max_limit)
        .min(state.feed_max_limit);

    let page = state
        .feed_service
        .build_feed(
            &user.id,
            FeedQuery {
                limit: Some(limit),
                before,
            },
        )
        .await?;

    let next_cursor = page.next_cursor.as_ref().map(FeedCursor::encode).transpose()?;

    Ok(ApiResponse::ok(FeedResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        next_cursor,
    }))
}

/// Feed routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/feed", post(feed))
}
