//! Session-related types for admin authentication.

use safeuse_backend::{Credentials, SessionUser};
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// Holds the backend user and the credentials replayed on every back-office
/// call made for this admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub user: SessionUser,
    pub credentials: Credentials,
}

/// Session keys for admin state.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// One-shot message shown on the next rendered page.
    pub const FLASH: &str = "flash";
}

/// The outcome of a mutation, carried across the redirect back to the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: String,
    pub is_error: bool,
}

impl Flash {
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }

    /// Failures are announced immediately.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        if self.is_error { "alert" } else { "status" }
    }
}
