//! Auth and session core of the Dynalab work-order admin dashboard.
//!
//! ARCHITECTURE
//! ============
//! `provider` talks to the identity service. `state::session::SessionStore`
//! is the one place the current session lives; everything else reads it or
//! subscribes to it. `services` wrap provider calls with notifications, and
//! `pages` turn them into form and navigation behavior.

pub mod config;
pub mod nav;
pub mod notify;
pub mod pages;
pub mod provider;
pub mod services;
pub mod state;
pub mod validate;

#[cfg(test)]
mod testing;
