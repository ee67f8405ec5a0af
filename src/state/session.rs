//! Session store — the single authority for who is logged in.
//!
//! DESIGN
//! ======
//! The store keeps the current `SessionState` in a `watch` channel: one
//! writer (the store itself), any number of readers, and every reader sees
//! the same value. Writes come only from provider events and explicit
//! sign-out. Handlers registered with `subscribe` see every transition in
//! provider emission order, without coalescing.
//!
//! LIFECYCLE
//! =========
//! `initialize` subscribes to the provider before fetching the current
//! session, so no event can fall between the two. The fetched value is only
//! applied while the store is still `Unknown`; an event that landed first
//! wins. The provider subscription is released once, by `teardown` or on
//! drop.
//!
//! EXPIRY
//! ======
//! `revalidate` hands an expired session back to the provider, which either
//! refreshes it (`TokenRefreshed`) or drops it (`SignedOut`). An expired
//! session the provider neither refreshes nor reports is cleared locally, so
//! the store never keeps serving it. `spawn_auto_refresh` runs `revalidate`
//! when the held session reaches `expires_at`; `teardown` stops it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::subscription::{Listeners, Subscription};
use crate::provider::IdentityProvider;
use crate::provider::types::{AuthError, AuthEvent, Session, unix_now};

/// Wait before retrying a refresh that failed on a transient error.
pub const REFRESH_RETRY_SECS: i64 = 5;

// =============================================================================
// STATE
// =============================================================================

/// Session lifecycle. `Unknown` holds only until the first fetch resolves.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Unknown | Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        session.map_or(Self::Unauthenticated, Self::Authenticated)
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    state: watch::Sender<SessionState>,
    listeners: Listeners,
    activated: AtomicBool,
    provider_subscription: Mutex<Option<Subscription>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::Unknown);
        Arc::new(Self {
            state,
            listeners: Listeners::new(),
            activated: AtomicBool::new(false),
            provider_subscription: Mutex::new(None),
            refresh_task: Mutex::new(None),
        })
    }

    /// Attach to `provider` and load its current session. Only the first
    /// call does anything.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the initial fetch fails. The store is
    /// left `Unauthenticated` rather than stuck in `Unknown`.
    pub async fn initialize(self: &Arc<Self>, provider: &dyn IdentityProvider) -> Result<(), AuthError> {
        if self.activated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let weak = Arc::downgrade(self);
        let subscription = provider.on_session_change(Arc::new(move |event: AuthEvent, session: Option<&Session>| {
            if let Some(store) = weak.upgrade() {
                store.apply(event, session.cloned());
            }
        }));
        *self.provider_subscription.lock() = Some(subscription);

        match provider.current_session().await {
            Ok(session) => {
                self.resolve_initial(session);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "initial session fetch failed");
                self.resolve_initial(None);
                Err(e)
            }
        }
    }

    /// Current session, if authenticated.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Async view of the state for consumers that await changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Register a handler for every later transition.
    pub fn subscribe(&self, handler: impl Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static) -> Subscription {
        self.listeners.subscribe(Arc::new(handler))
    }

    /// Refresh or drop the held session once it has expired. A session that
    /// is absent or still valid is left alone without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the refresh fails transiently. The
    /// expired session is kept so a later call can retry.
    pub async fn revalidate(&self, provider: &dyn IdentityProvider) -> Result<(), AuthError> {
        let Some(held) = self.current() else {
            return Ok(());
        };
        if !held.is_expired_at(unix_now()) {
            return Ok(());
        }
        debug!(user_id = %held.user.id, "session expired; revalidating");

        let reported = provider.current_session().await?;
        // The provider usually reports the outcome through its own event.
        if self.current().as_ref() != Some(&held) {
            return Ok(());
        }
        match reported {
            Some(fresh) if !fresh.is_expired_at(unix_now()) => self.apply(AuthEvent::TokenRefreshed, Some(fresh)),
            _ => {
                warn!(user_id = %held.user.id, "expired session was not refreshed");
                self.clear();
            }
        }
        Ok(())
    }

    /// Revalidate in the background whenever the held session reaches its
    /// expiry. Replaces any task started earlier.
    pub fn spawn_auto_refresh(self: &Arc<Self>, provider: Arc<dyn IdentityProvider>) {
        let weak = Arc::downgrade(self);
        let mut rx = self.watch();
        let task = tokio::spawn(async move {
            let mut retry_at: Option<i64> = None;
            loop {
                let due = {
                    let state = rx.borrow_and_update();
                    state.session().and_then(|s| s.expires_at).map(|at| retry_at.map_or(at, |r| r.max(at)))
                };
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        retry_at = None;
                    }
                    () = sleep_until_unix(due) => {
                        let Some(store) = weak.upgrade() else {
                            break;
                        };
                        match store.revalidate(&*provider).await {
                            Ok(()) => retry_at = None,
                            Err(e) => {
                                warn!(error = %e, retry_in_secs = REFRESH_RETRY_SECS, "session refresh failed");
                                retry_at = Some(unix_now().saturating_add(REFRESH_RETRY_SECS));
                            }
                        }
                    }
                }
            }
            debug!("auto refresh stopped");
        });
        if let Some(previous) = self.refresh_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Release the provider subscription and stop auto refresh. Later calls
    /// are no-ops.
    pub fn teardown(&self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
        let subscription = self.provider_subscription.lock().take();
        if let Some(mut subscription) = subscription {
            subscription.unsubscribe();
            debug!("session store detached from provider");
        }
    }

    /// Replace the current value with what the provider reported.
    pub(crate) fn apply(&self, event: AuthEvent, session: Option<Session>) {
        let next = SessionState::from(session);
        let previous = self.state.send_replace(next.clone());
        debug!(?event, from = previous.label(), to = next.label(), "session transition");
        self.listeners.emit(event, next.session());
    }

    /// Local sign-out. Notifies only if the value actually changes, so a
    /// provider `SignedOut` that already cleared it is not repeated.
    pub(crate) fn clear(&self) {
        let changed = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Unauthenticated) {
                return false;
            }
            *state = SessionState::Unauthenticated;
            true
        });
        if changed {
            debug!("session cleared locally");
            self.listeners.emit(AuthEvent::SignedOut, None);
        }
    }

    fn resolve_initial(&self, session: Option<Session>) {
        let next = SessionState::from(session);
        let applied = self.state.send_if_modified(|state| {
            if !matches!(state, SessionState::Unknown) {
                return false;
            }
            *state = next.clone();
            true
        });
        if applied {
            debug!(to = next.label(), "initial session resolved");
            self.listeners.emit(AuthEvent::InitialSession, next.session());
        }
    }
}

/// Sleep until the unix second `at`; never wakes when there is nothing due.
async fn sleep_until_unix(at: Option<i64>) {
    match at {
        Some(at) => {
            let secs = u64::try_from(at.saturating_sub(unix_now())).unwrap_or(0);
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
