//! User-facing notifications (toasts).
//!
//! Fire-and-forget: nothing is queued or retried. The binary renders them
//! through the log; a UI would render them as toasts.

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), severity: Severity::Info }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), severity: Severity::Error }
    }
}

pub trait Notifier: Send + Sync {
    fn show(&self, notification: Notification);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, n: Notification) {
        match n.severity {
            Severity::Info => info!(title = %n.title, description = %n.description, "notification"),
            Severity::Error => warn!(title = %n.title, description = %n.description, "notification"),
        }
    }
}
