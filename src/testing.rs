//! Test doubles shared by unit tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::nav::{Navigator, Route};
use crate::notify::{Notification, Notifier};
use crate::provider::IdentityProvider;
use crate::provider::types::{AuthError, AuthEvent, Session, SignUpMetadata, unix_now};
use crate::state::subscription::{Listeners, SessionHandler, Subscription};

pub const USER_ID: &str = "5b1c3c1e-8a4e-4a53-9b8e-2f7a0c7d9e11";

pub fn test_session(role: Option<&str>) -> Session {
    serde_json::from_value(serde_json::json!({
        "access_token": "access",
        "refresh_token": "refresh",
        "expires_in": 3600,
        "expires_at": i64::MAX / 2,
        "user": {
            "id": USER_ID,
            "email": "user@dynalab.com.ar",
            "role": role,
            "user_metadata": { "full_name": "Juan Perez" }
        }
    }))
    .unwrap()
}

/// Same user as `test_session`, with an expiry long in the past.
pub fn expired_session(role: Option<&str>) -> Session {
    let mut session = test_session(role);
    session.access_token = "stale".into();
    session.expires_at = Some(1);
    session
}

pub fn rejected(message: &str) -> AuthError {
    AuthError::Rejected { status: 400, message: message.to_owned() }
}

// =============================================================================
// FAKE PROVIDER
// =============================================================================

/// Scripted in-memory identity provider.
#[derive(Default)]
pub struct FakeProvider {
    listeners: Listeners,
    session: Mutex<Option<Session>>,
    role: Mutex<Option<String>>,
    initial_error: Mutex<Option<AuthError>>,
    sign_in_error: Mutex<Option<AuthError>>,
    sign_up_error: Mutex<Option<AuthError>>,
    sign_out_error: Mutex<Option<AuthError>>,
    sign_up_issues_session: Mutex<bool>,
    on_expiry: Mutex<Option<Option<Session>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signed_in(role: Option<&str>) -> Arc<Self> {
        let provider = Self::default();
        *provider.session.lock() = Some(test_session(role));
        Arc::new(provider)
    }

    pub fn with_role(self: Arc<Self>, role: &str) -> Arc<Self> {
        *self.role.lock() = Some(role.to_owned());
        self
    }

    pub fn fail_initial(self: Arc<Self>, err: AuthError) -> Arc<Self> {
        *self.initial_error.lock() = Some(err);
        self
    }

    pub fn reject_sign_in(self: Arc<Self>, err: AuthError) -> Arc<Self> {
        *self.sign_in_error.lock() = Some(err);
        self
    }

    pub fn reject_sign_up(self: Arc<Self>, err: AuthError) -> Arc<Self> {
        *self.sign_up_error.lock() = Some(err);
        self
    }

    pub fn reject_sign_out(self: Arc<Self>, err: AuthError) -> Arc<Self> {
        *self.sign_out_error.lock() = Some(err);
        self
    }

    pub fn auto_confirm_sign_ups(self: Arc<Self>) -> Arc<Self> {
        *self.sign_up_issues_session.lock() = true;
        self
    }

    /// When `current_session` finds the held session expired, report
    /// `refreshed` as `TokenRefreshed`, or `SignedOut` when it is `None`.
    pub fn refresh_expired_with(self: Arc<Self>, refreshed: Option<Session>) -> Arc<Self> {
        *self.on_expiry.lock() = Some(refreshed);
        self
    }

    /// Park sign-in and sign-up until `gate` is notified.
    pub fn hold_requests(self: Arc<Self>, gate: Arc<Notify>) -> Arc<Self> {
        *self.gate.lock() = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Push an event as if the provider had observed it on its own.
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        *self.session.lock() = session.clone();
        self.listeners.emit(event, session.as_ref());
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn issue_session(&self) -> Session {
        let role = self.role.lock().clone();
        test_session(role.as_deref())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.record("current_session");
        if let Some(err) = self.initial_error.lock().clone() {
            return Err(err);
        }
        let held = self.session.lock().clone();
        let expired = held.as_ref().is_some_and(|s| s.is_expired_at(unix_now()));
        let script = self.on_expiry.lock().clone();
        match script {
            Some(Some(fresh)) if expired => {
                self.emit(AuthEvent::TokenRefreshed, Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Some(None) if expired => {
                self.emit(AuthEvent::SignedOut, None);
                Ok(None)
            }
            _ => Ok(held),
        }
    }

    fn on_session_change(&self, handler: SessionHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
        self.record(format!("sign_in:{email}"));
        self.wait_gate().await;
        if let Some(err) = self.sign_in_error.lock().clone() {
            return Err(err);
        }
        let session = self.issue_session();
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, _password: &str, metadata: SignUpMetadata) -> Result<Option<Session>, AuthError> {
        self.record(format!("sign_up:{email}:{}", metadata.full_name));
        self.wait_gate().await;
        if let Some(err) = self.sign_up_error.lock().clone() {
            return Err(err);
        }
        if !*self.sign_up_issues_session.lock() {
            return Ok(None);
        }
        let session = self.issue_session();
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.record("sign_out");
        if let Some(err) = self.sign_out_error.lock().clone() {
            return Err(err);
        }
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }
}

// =============================================================================
// RECORDING SURFACES
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notification: Notification) {
        self.shown.lock().push(notification);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().push(route);
    }
}
