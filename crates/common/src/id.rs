//! ID generation utilities.

use std::sync::{LazyLock, Mutex, PoisonError};

use ulid::{Generator, Ulid};
use uuid::Uuid;

/// Process-wide generator so every service shares one monotonic sequence.
static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// IDs issued by one process are strictly increasing, including within the
    /// same millisecond, so they double as an insertion-order key.
    #[must_use]
    pub fn generate(&self) -> String {
        let ulid = GENERATOR
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
            // Overflow of the random part within one millisecond.
            .unwrap_or_else(|_| Ulid::new());
        ulid.to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component)
        Uuid::new_v4().simple().to_string()
    }
}
