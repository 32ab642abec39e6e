//! API endpoints.

mod auth;
mod dweets;
mod feed;
mod following;
mod profiles;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(feed::router())
        .merge(profiles::me_router())
        .nest("/profiles", profiles::router())
        .nest("/following", following::router())
        .nest("/dweets", dweets::router())
}
