//! HTTP API layer for dwitter.
//!
//! RPC-style JSON endpoints: every call is a `POST` under `/api` with a
//! JSON body, and successful responses are wrapped as `{"data": ...}`.
//!
//! - **Endpoints**: signup, profiles, following, dweets and the feed
//! - **Extractors**: the authenticated user
//! - **Middleware**: bearer token authentication

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
