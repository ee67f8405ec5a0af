//! Domain services used by the page controllers.
//!
//! ARCHITECTURE
//! ============
//! Services own provider calls and user-facing notifications so controllers
//! can stay focused on form state and navigation.

pub mod auth;
pub mod work_orders;
