//! Database entities.

pub mod dweet;
pub mod following;
pub mod profile;
pub mod user;

pub use dweet::Entity as Dweet;
pub use following::Entity as Following;
pub use profile::Entity as Profile;
pub use user::Entity as User;
