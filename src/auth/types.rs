//! Types for authentication and user management

use serde::{Deserialize, Serialize};

use crate::auth::Session;

/// User data as returned by GoTrue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// The user's phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// Profile data supplied at sign-up (`full_name`, ...)
    #[serde(default)]
    pub user_metadata: serde_json::Value,

    #[serde(default)]
    pub app_metadata: serde_json::Value,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// `user_metadata.full_name`, when present and non-empty
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.trim().is_empty())
    }

    /// Label for navigation: full name, then email, then id
    pub fn display_name(&self) -> &str {
        self.full_name()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Result of a sign-up. Without auto-confirm there is no session yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

/// Kind of session transition broadcast by [`crate::auth::Auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A session transition and the session after it
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}
