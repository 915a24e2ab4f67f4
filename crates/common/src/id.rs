//! ID generation utilities.

use std::sync::{LazyLock, Mutex};

use ulid::{Generator, Ulid};
use uuid::Uuid;

static ULID_GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Kind-specific prefix of an order code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCodePrefix {
    /// Orders placed from a catalog template.
    Template,
    /// Orders placed through the questionnaire.
    Custom,
}

impl OrderCodePrefix {
    /// The literal prefix, including the trailing dash.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Template => "TMP-",
            Self::Custom => "CUST-",
        }
    }
}

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
    /// IDs are monotonic within the process, so sorting by primary key
    /// follows creation order even inside one millisecond.
    #[must_use]
    pub fn generate(&self) -> String {
        let ulid = ULID_GENERATOR.lock().map_or_else(
            |_| Ulid::new(),
            |mut generator| generator.generate().unwrap_or_else(|_| Ulid::new()),
        );
        ulid.to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component for security)
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a human-facing order code such as `TMP-3f9a0c12`.
    #[must_use]
    pub fn generate_order_code(&self, prefix: OrderCodePrefix) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!("{}{}", prefix.as_str(), &random[..8])
    }

    /// Generate an 8-character public user identifier.
    #[must_use]
    pub fn generate_uid(&self) -> String {
        Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    }
}
