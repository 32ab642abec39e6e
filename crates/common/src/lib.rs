//! Common utilities and shared types for dwitter-rs.
//!
//! This crate provides foundational components used across all dwitter-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: Monotonic ULID identifiers via [`IdGenerator`]
//! - **Time**: Strictly increasing timestamps via [`monotonic_now`]
//!
//! # Example
//!
//! ```no_run
//! use dwitter_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on port {} with first id {}", config.server.port, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod time;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use time::monotonic_now;
