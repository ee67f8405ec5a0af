//! Provider types — the session value, change events, and auth errors.
//!
//! The session shape mirrors what GoTrue returns from its token endpoint.
//! Nothing in this crate mutates a `Session` after it is received; the store
//! only replaces one value with the next.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Errors raised by the identity provider.
///
/// `Display` is the human-readable message shown in notifications, so the
/// `Rejected` variant renders the provider's own wording verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The provider refused the request (bad credentials, policy, etc.).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a body we could not understand.
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AuthError {
    /// True for failures worth retrying later (transport and 5xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rejected { status: 500..=599, .. })
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Authenticated identity issued by the provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds, as issued.
    pub expires_in: i64,
    /// Absolute expiry as a unix timestamp. Older GoTrue builds omit it.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

/// Wall-clock time in unix seconds, the unit session expiry is expressed in.
#[must_use]
pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

impl Session {
    /// Whether the session is past its expiry at `now` (unix seconds).
    /// Sessions without an absolute expiry never report expired.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Role projection used to gate destructive dashboard actions.
    #[must_use]
    pub fn role(&self) -> Role {
        match self.user.role.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::Member,
        }
    }
}

// Tokens stay out of logs and panic messages.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// User record embedded in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
}

impl SessionUser {
    /// Full name recorded at registration, if any.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(serde_json::Value::as_str)
    }
}

/// Read-only role derived from the session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    Member,
}

// =============================================================================
// EVENTS
// =============================================================================

/// Session transitions reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Profile metadata attached to a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpMetadata {
    pub full_name: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
