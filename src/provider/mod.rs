//! Identity provider — the external authority for sessions.
//!
//! DESIGN
//! ======
//! The provider owns credential verification, token issuance, and
//! persistence. This crate consumes it only through `IdentityProvider`, a
//! narrow object-safe trait. `GoTrueProvider` speaks the Supabase GoTrue
//! REST API; tests substitute an in-memory fake.

pub mod gotrue;
pub mod types;

pub use gotrue::GoTrueProvider;
pub use types::{AuthError, AuthEvent, Role, Session, SessionUser, SignUpMetadata};

use crate::state::subscription::{SessionHandler, Subscription};

/// Capability contract every identity backend satisfies.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, or `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Register for session transitions. Events arrive in emission order.
    fn on_session_change(&self, handler: SessionHandler) -> Subscription;

    /// Verify credentials and start a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account. Returns `None` when the account still needs email
    /// confirmation before a session can be issued.
    async fn sign_up(&self, email: &str, password: &str, metadata: SignUpMetadata) -> Result<Option<Session>, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
