//! Business logic services.

pub mod dweet;
pub mod feed;
pub mod graph;
pub mod user;

pub use dweet::{CreateDweetInput, DweetService};
pub use feed::{FeedCursor, FeedItem, FeedPage, FeedQuery, FeedService};
pub use graph::{FollowResult, GraphService, ProfileStats};
pub use user::{RegisterInput, UserService};
