//! Change-handler registry and its release handle.
//!
//! DESIGN
//! ======
//! `Listeners` is shared by the session store and the GoTrue provider. Each
//! `subscribe` returns a `Subscription` that removes the handler when
//! `unsubscribe` is called or the handle is dropped, whichever comes first.
//! Dispatch snapshots the handler set before invoking anything, so a handler
//! may release its own subscription mid-callback.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::provider::types::{AuthEvent, Session};

/// Callback invoked on each session transition, in emission order.
pub type SessionHandler = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Release handle for a registered handler.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Stop delivery to the handler. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

#[derive(Default)]
struct HandlerSet {
    next_id: u64,
    handlers: BTreeMap<u64, SessionHandler>,
}

/// Ordered set of session handlers.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<HandlerSet>>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; it runs for every later `emit` until released.
    pub fn subscribe(&self, handler: SessionHandler) -> Subscription {
        let id = {
            let mut set = self.inner.lock();
            let id = set.next_id;
            set.next_id += 1;
            set.handlers.insert(id, handler);
            id
        };

        let weak: Weak<Mutex<HandlerSet>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().handlers.remove(&id);
            }
        })
    }

    /// Deliver an event to every registered handler, oldest first.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let snapshot: Vec<SessionHandler> = self.inner.lock().handlers.values().cloned().collect();
        for handler in snapshot {
            handler(event, session);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "subscription_test.rs"]
mod tests;
