//! Repositories wrapping the entities.

pub mod dweet;
pub mod following;
pub mod profile;
pub mod user;

pub use dweet::DweetRepository;
pub use following::FollowingRepository;
pub use profile::ProfileRepository;
pub use user::UserRepository;
