//! Page controllers: the auth form and the dashboard shell.

pub mod auth;
pub mod dashboard;
