//! Core business logic for dwitter-rs.
//!
//! - [`GraphService`]: profile provisioning and the follow relation
//! - [`DweetService`]: posting and per-author listing
//! - [`FeedService`]: the personalized, newest-first feed
//! - [`UserService`]: the identity boundary feeding user ids into the graph

pub mod services;

pub use services::*;
