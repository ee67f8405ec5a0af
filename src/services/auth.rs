//! Auth service — sign-in, sign-up, and sign-out over the identity provider.
//!
//! DESIGN
//! ======
//! Every failure is surfaced once through the notifier and then returned to
//! the caller, so a form controller can reset its own state without showing
//! a second message. Success never navigates; the caller decides what comes
//! next.

use std::sync::Arc;

use tracing::{debug, info};

use crate::notify::{Notification, Notifier};
use crate::provider::IdentityProvider;
use crate::provider::types::{AuthError, Session, SignUpMetadata};
use crate::state::session::SessionStore;

pub const SIGN_IN_FAILED_TITLE: &str = "Error al iniciar sesión";
pub const SIGN_UP_FAILED_TITLE: &str = "Error al registrarse";
pub const SIGN_OUT_FAILED_TITLE: &str = "Error al cerrar sesión";
pub const SIGN_UP_OK_TITLE: &str = "Registro exitoso";
pub const SIGN_UP_OK_DESCRIPTION: &str = "Por favor, verifica tu correo electrónico para continuar.";

pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<SessionStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { provider, store, notifier }
    }

    /// Current session as held by the store.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.store.current()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// # Errors
    ///
    /// Returns the provider's error after notifying the user.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        debug!(%email, "sign-in requested");
        self.provider
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| self.report(SIGN_IN_FAILED_TITLE, e))?;
        Ok(())
    }

    /// Create an account with `full_name` as profile metadata. The account
    /// may still need email confirmation before it can sign in.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after notifying the user.
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<(), AuthError> {
        debug!(%email, "sign-up requested");
        let metadata = SignUpMetadata { full_name: full_name.to_owned() };
        let session = self
            .provider
            .sign_up(email, password, metadata)
            .await
            .map_err(|e| self.report(SIGN_UP_FAILED_TITLE, e))?;

        info!(confirmed = session.is_some(), "account created");
        self.notifier.show(Notification::info(SIGN_UP_OK_TITLE, SIGN_UP_OK_DESCRIPTION));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the provider's error after notifying the user. The session is
    /// left as it was.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider
            .sign_out()
            .await
            .map_err(|e| self.report(SIGN_OUT_FAILED_TITLE, e))?;
        self.store.clear();
        Ok(())
    }

    fn report(&self, title: &str, err: AuthError) -> AuthError {
        self.notifier.show(Notification::error(title, err.to_string()));
        err
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
