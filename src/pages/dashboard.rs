//! Dashboard shell — the session-gated landing page.
//!
//! Mounting requires a session. While mounted the shell watches the store
//! and sends the user back to `/auth` the first time the session goes away,
//! whether through sign-out, a refused refresh, or any other provider
//! report. Dropping the shell releases that watch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::nav::{Navigator, Route};
use crate::provider::types::{AuthError, AuthEvent, Role, Session};
use crate::services::auth::AuthService;
use crate::services::work_orders::{WorkOrder, WorkOrderError, WorkOrderList, WorkOrderRow};
use crate::state::session::SessionStore;
use crate::state::subscription::Subscription;

pub const TITLE: &str = "Dashboard";
pub const WELCOME: &str = "Bienvenido al Dashboard";

pub struct DashboardShell {
    store: Arc<SessionStore>,
    auth: Arc<AuthService>,
    orders: Arc<WorkOrderList>,
    _redirect: Subscription,
}

impl DashboardShell {
    /// Mount the shell, or navigate to `/auth` and return `None` when no
    /// one is signed in.
    pub fn mount(
        store: Arc<SessionStore>,
        auth: Arc<AuthService>,
        navigator: Arc<dyn Navigator>,
        orders: Arc<WorkOrderList>,
    ) -> Option<Self> {
        let Some(session) = store.current() else {
            navigator.navigate(Route::Auth);
            return None;
        };
        info!(user_id = %session.user.id, role = ?session.role(), "dashboard mounted");

        let left = AtomicBool::new(false);
        let redirect = store.subscribe(move |event: AuthEvent, session: Option<&Session>| {
            if session.is_none() && !left.swap(true, Ordering::SeqCst) {
                info!(?event, "session ended; leaving dashboard");
                navigator.navigate(Route::Auth);
            }
        });

        Some(Self { store, auth, orders, _redirect: redirect })
    }

    /// Role of the signed-in user. Falls back to `Member` once the session
    /// is gone.
    #[must_use]
    pub fn role(&self) -> Role {
        self.store.current().as_ref().map(Session::role).unwrap_or_default()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// Name shown in the header: full name, else email, else user id.
    #[must_use]
    pub fn user_label(&self) -> Option<String> {
        let user = self.store.current()?.user;
        let label = match (user.full_name(), &user.email) {
            (Some(name), _) => name.to_owned(),
            (None, Some(email)) => email.clone(),
            (None, None) => user.id.to_string(),
        };
        Some(label)
    }

    /// # Errors
    ///
    /// Returns the provider's error; the user stays on the dashboard.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out().await
    }

    pub async fn work_orders(&self) -> Vec<WorkOrderRow> {
        self.orders.rows(self.role()).await
    }

    /// # Errors
    ///
    /// See [`WorkOrderList::edit`].
    pub async fn edit_work_order(&self, id: &str) -> Result<WorkOrder, WorkOrderError> {
        self.orders.edit(self.role(), id).await
    }

    /// # Errors
    ///
    /// See [`WorkOrderList::delete`].
    pub async fn delete_work_order(&self, id: &str, confirmed: bool) -> Result<bool, WorkOrderError> {
        self.orders.delete(self.role(), id, confirmed).await
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
