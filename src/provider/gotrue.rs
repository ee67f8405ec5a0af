//! Supabase GoTrue REST client.
//!
//! Thin HTTP wrapper over `/auth/v1/token`, `/auth/v1/signup`, and
//! `/auth/v1/logout`. The provider holds the live session in memory and
//! reports every replacement to its listeners. Response parsing lives in
//! pure functions for testability.

use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::IdentityProvider;
use super::types::{AuthError, AuthEvent, Session, SignUpMetadata, unix_now};
use crate::config::AppConfig;
use crate::state::subscription::{Listeners, SessionHandler, Subscription};

const PASSWORD_GRANT_PATH: &str = "/auth/v1/token?grant_type=password";
const REFRESH_GRANT_PATH: &str = "/auth/v1/token?grant_type=refresh_token";
const SIGNUP_PATH: &str = "/auth/v1/signup";
const LOGOUT_PATH: &str = "/auth/v1/logout";

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoTrueProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Mutex<Option<Session>>,
    listeners: Listeners,
}

impl GoTrueProvider {
    /// Build a provider for the configured project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
            session: Mutex::new(None),
            listeners: Listeners::new(),
        })
    }

    /// Exchange the held refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the provider refuses the token, or a transport
    /// error if the request fails.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let text = self.post(REFRESH_GRANT_PATH, None, &body).await?;
        let session = parse_session(&text, unix_now())?;
        info!(user_id = %session.user.id, "session refreshed");
        self.replace_session(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    fn replace_session(&self, event: AuthEvent, session: Option<Session>) {
        *self.session.lock() = session.clone();
        self.listeners.emit(event, session.as_ref());
    }

    async fn post(&self, path: &str, bearer: Option<&str>, body: &Value) -> Result<String, AuthError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "gotrue request");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected { status, message: parse_error_message(status, &text) });
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let held = self.session.lock().clone();
        let Some(session) = held else {
            return Ok(None);
        };
        if !session.is_expired_at(unix_now()) {
            return Ok(Some(session));
        }

        match self.refresh_session(&session.refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                warn!(error = %e, user_id = %session.user.id, "session expired and refresh was refused");
                self.replace_session(AuthEvent::SignedOut, None);
                Ok(None)
            }
        }
    }

    fn on_session_change(&self, handler: SessionHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let text = self.post(PASSWORD_GRANT_PATH, None, &body).await?;
        let session = parse_session(&text, unix_now())?;
        info!(user_id = %session.user.id, "signed in");
        self.replace_session(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: SignUpMetadata) -> Result<Option<Session>, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password, "data": metadata });
        let text = self.post(SIGNUP_PATH, None, &body).await?;
        let session = parse_signup(&text, unix_now())?;
        match &session {
            Some(s) => {
                info!(user_id = %s.user.id, "signed up with immediate session");
                self.replace_session(AuthEvent::SignedIn, Some(s.clone()));
            }
            None => info!("signed up, confirmation pending"),
        }
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let held = self.session.lock().clone();
        if let Some(session) = held {
            match self.post(LOGOUT_PATH, Some(&session.access_token), &serde_json::json!({})).await {
                Ok(_) => {}
                // Already revoked server-side; the local copy still goes.
                Err(AuthError::Rejected { status: 401 | 403 | 404, .. }) => {}
                Err(e) => return Err(e),
            }
            info!(user_id = %session.user.id, "signed out");
        }
        self.replace_session(AuthEvent::SignedOut, None);
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a token-endpoint body into a session, deriving `expires_at` from
/// `expires_in` when the server omits it.
pub(crate) fn parse_session(body: &str, now: i64) -> Result<Session, AuthError> {
    let mut session: Session =
        serde_json::from_str(body).map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
    if session.expires_at.is_none() {
        session.expires_at = Some(now.saturating_add(session.expires_in));
    }
    Ok(session)
}

/// Parse a signup body: a full session when auto-confirm is on, otherwise a
/// bare user record awaiting email confirmation.
pub(crate) fn parse_signup(body: &str, now: i64) -> Result<Option<Session>, AuthError> {
    let value: Value = serde_json::from_str(body).map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
    if value.get("access_token").is_some() {
        return parse_session(body, now).map(Some);
    }
    if value.get("id").is_some() {
        return Ok(None);
    }
    Err(AuthError::UnexpectedResponse(format!("signup response has neither session nor user: {body}")))
}

/// Pull the human-readable message out of a GoTrue error body.
pub(crate) fn parse_error_message(status: u16, body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return format!("HTTP {status}");
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .find(|msg| !msg.trim().is_empty())
        .map_or_else(|| format!("HTTP {status}"), str::to_owned)
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
