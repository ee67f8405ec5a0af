//! Routes and the navigation surface.

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Auth,
    Dashboard,
}

impl Route {
    /// Landing route after a successful sign-in or sign-up.
    pub const LANDING: Self = Self::Dashboard;

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Auth => "/auth",
            Self::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that remembers the current route and publishes changes.
#[derive(Debug)]
pub struct RouteTracker {
    current: watch::Sender<Route>,
}

impl RouteTracker {
    #[must_use]
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Navigator for RouteTracker {
    fn navigate(&self, route: Route) {
        debug!(%route, "navigate");
        self.current.send_replace(route);
    }
}

#[cfg(test)]
#[path = "nav_test.rs"]
mod tests;
