//! API integration tests.
//!
//! These tests drive the router end to end against an in-memory database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware,
};
use dwitter_api::{AppState, auth_middleware, router as api_router};
use dwitter_core::{DweetService, FeedService, GraphService, UserService};
use dwitter_db::{
    repositories::{DweetRepository, FollowingRepository, ProfileRepository, UserRepository},
    test_utils::TestDatabase,
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Create the application on a fresh database.
async fn create_test_app(feed_max_limit: u64) -> (Router, TestDatabase) {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();

    let user_repo = UserRepository::new(conn.clone());
    let profile_repo = ProfileRepository::new(conn.clone());
    let following_repo = FollowingRepository::new(conn.clone());
    let dweet_repo = DweetRepository::new(conn.clone());

    let graph_service = GraphService::new(conn, profile_repo.clone(), following_repo);
    let state = AppState {
        user_service: UserService::new(user_repo.clone(), graph_service.clone()),
        dweet_service: DweetService::new(
            dweet_repo.clone(),
            profile_repo.clone(),
            graph_service.clone(),
        ),
        feed_service: FeedService::new(graph_service.clone(), dweet_repo, user_repo, profile_repo),
        graph_service,
        feed_max_limit,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    (app, db)
}

async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Sign up and return `(token, profile_id)`.
async fn signup(app: &Router, username: &str) -> (String, String) {
    let (status, body) = post(app, "/api/signup", None, json!({ "username": username })).await;
    assert_eq!(status, StatusCode::OK, "signup failed: {body}");

    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["profileId"].as_str().unwrap().to_string(),
    )
}

async fn post_dweet(app: &Router, token: &str, text: &str) -> (StatusCode, Value) {
    post(app, "/api/dweets/create", Some(token), json!({ "body": text })).await
}

fn feed_bodies(body: &Value) -> Vec<&str> {
    body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["body"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_signup_and_me() {
    let (app, _db) = create_test_app(100).await;
    let (token, profile_id) = signup(&app, "alice").await;

    let (status, body) = post(&app, "/api/i", Some(&token), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], profile_id);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["followingCount"], 1);
    assert_eq!(body["data"]["followersCount"], 1);
    assert_eq!(body["data"]["isFollowing"], true);
}

#[tokio::test]
async fn test_signup_rejects_invalid_and_duplicate_usernames() {
    let (app, _db) = create_test_app(100).await;
    signup(&app, "alice").await;

    let (status, body) = post(&app, "/api/signup", None, json!({ "username": "alice" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_EXISTS");

    let (status, _) = post(&app, "/api/signup", None, json!({ "username": "no spaces" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_requires_authentication() {
    let (app, _db) = create_test_app(100).await;

    let (status, _) = post(&app, "/api/feed", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/api/feed", Some("bogus"), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_follow_statuses() {
    let (app, _db) = create_test_app(100).await;
    let (alice, alice_profile) = signup(&app, "alice").await;
    let (_, bob_profile) = signup(&app, "bob").await;

    let follow = json!({ "profileId": bob_profile });
    let (_, first) = post(&app, "/api/following/create", Some(&alice), follow.clone()).await;
    let (_, second) = post(&app, "/api/following/create", Some(&alice), follow).await;
    let (_, own) = post(
        &app,
        "/api/following/create",
        Some(&alice),
        json!({ "profileId": alice_profile }),
    )
    .await;

    assert_eq!(first["data"]["status"], "following");
    assert_eq!(second["data"]["status"], "already_following");
    assert_eq!(own["data"]["status"], "self");
}

#[tokio::test]
async fn test_unfollow_self_is_rejected() {
    let (app, _db) = create_test_app(100).await;
    let (alice, alice_profile) = signup(&app, "alice").await;

    let (status, body) = post(
        &app,
        "/api/following/delete",
        Some(&alice),
        json!({ "profileId": alice_profile }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVARIANT_VIOLATION");
}

#[tokio::test]
async fn test_follow_unknown_profile() {
    let (app, _db) = create_test_app(100).await;
    let (alice, _) = signup(&app, "alice").await;

    let (status, _) = post(
        &app,
        "/api/following/create",
        Some(&alice),
        json!({ "profileId": "missing" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_followers_and_following_lists() {
    let (app, _db) = create_test_app(100).await;
    let (alice, alice_profile) = signup(&app, "alice").await;
    let (_, bob_profile) = signup(&app, "bob").await;
    post(
        &app,
        "/api/following/create",
        Some(&alice),
        json!({ "profileId": bob_profile }),
    )
    .await;

    let (_, followers) = post(
        &app,
        "/api/profiles/followers",
        Some(&alice),
        json!({ "profileId": bob_profile }),
    )
    .await;
    let (_, following) = post(
        &app,
        "/api/profiles/following",
        Some(&alice),
        json!({ "profileId": alice_profile }),
    )
    .await;

    let names = |v: &Value| -> Vec<String> {
        v["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["username"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(names(&followers), vec!["alice", "bob"]);
    assert_eq!(names(&following), vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_profiles_list_excludes_caller() {
    let (app, _db) = create_test_app(100).await;
    let (alice, _) = signup(&app, "alice").await;
    signup(&app, "bob").await;

    let (status, body) = post(&app, "/api/profiles/list", Some(&alice), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    let profiles = body["data"].as_array().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["username"], "bob");
}

#[tokio::test]
async fn test_dweet_validation() {
    let (app, _db) = create_test_app(100).await;
    let (alice, _) = signup(&app, "alice").await;

    let (status, body) = post_dweet(&app, &alice, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = post_dweet(&app, &alice, &"x".repeat(141)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_dweet(&app, &alice, &"x".repeat(140)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_feed_includes_own_and_followed_dweets() {
    let (app, _db) = create_test_app(100).await;
    let (alice, _) = signup(&app, "alice").await;
    let (bob, bob_profile) = signup(&app, "bob").await;
    let (carol, _) = signup(&app, "carol").await;
    post(
        &app,
        "/api/following/create",
        Some(&alice),
        json!({ "profileId": bob_profile }),
    )
    .await;

    post_dweet(&app, &bob, "bob 1").await;
    post_dweet(&app, &alice, "alice 1").await;
    post_dweet(&app, &carol, "carol 1").await;
    post_dweet(&app, &bob, "bob 2").await;

    let (status, body) = post(&app, "/api/feed", Some(&alice), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed_bodies(&body), vec!["bob 2", "alice 1", "bob 1"]);
    assert_eq!(body["data"]["items"][0]["authorDisplayName"], "bob");
    assert!(body["data"]["nextCursor"].is_null());

    let (_, bob_feed) = post(&app, "/api/feed", Some(&bob), json!({})).await;
    assert_eq!(feed_bodies(&bob_feed), vec!["bob 2", "bob 1"]);
}

#[tokio::test]
async fn test_feed_pagination_is_capped() {
    let (app, _db) = create_test_app(2).await;
    let (alice, _) = signup(&app, "alice").await;
    for text in ["one", "two", "three"] {
        post_dweet(&app, &alice, text).await;
    }

    let (_, first) = post(&app, "/api/feed", Some(&alice), json!({ "limit": 50 })).await;
    assert_eq!(feed_bodies(&first), vec!["three", "two"]);
    let cursor = first["data"]["nextCursor"].as_str().unwrap().to_string();

    let (_, second) = post(&app, "/api/feed", Some(&alice), json!({ "cursor": cursor })).await;
    assert_eq!(feed_bodies(&second), vec!["one"]);
    assert!(second["data"]["nextCursor"].is_null());
}

#[tokio::test]
async fn test_feed_rejects_bad_cursor() {
    let (app, _db) = create_test_app(100).await;
    let (alice, _) = signup(&app, "alice").await;

    let (status, body) = post(&app, "/api/feed", Some(&alice), json!({ "cursor": "@@@" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_user_dweets() {
    let (app, _db) = create_test_app(100).await;
    let (alice, alice_profile) = signup(&app, "alice").await;
    post_dweet(&app, &alice, "first").await;
    post_dweet(&app, &alice, "second").await;

    let (status, body) = post(
        &app,
        "/api/dweets/user",
        Some(&alice),
        json!({ "profileId": alice_profile }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["second", "first"]);
}

#[tokio::test]
async fn test_show_dweet() {
    let (app, _db) = create_test_app(100).await;
    let (alice, _) = signup(&app, "alice").await;
    let (_, created) = post_dweet(&app, &alice, "hello").await;
    let dweet_id = created["data"]["id"].as_str().unwrap();

    let (status, body) = post(
        &app,
        "/api/dweets/show",
        Some(&alice),
        json!({ "dweetId": dweet_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["body"], "hello");

    let (status, _) = post(
        &app,
        "/api/dweets/show",
        Some(&alice),
        json!({ "dweetId": "missing" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, me) = post(&app, "/api/i", Some(&alice), json!({})).await;
    assert_eq!(me["data"]["dweetsCount"], 1);
}
