//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Configured admin username.
    pub username: String,
    /// When the login happened.
    pub logged_in_at: DateTime<Utc>,
}

impl CurrentAdmin {
    /// Identity for a login that just succeeded.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            logged_in_at: Utc::now(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
