//! Auth page controller — login and registration forms.
//!
//! DESIGN
//! ======
//! Validation runs first and short-circuits: an invalid form never reaches
//! the provider and never flips the submitting flag. A valid form sets the
//! flag, awaits the auth service, and a `SubmitGuard` clears the flag on
//! every exit path. The service already notified the user about failures,
//! so the controller only reports the outcome.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::nav::{Navigator, Route};
use crate::provider::types::AuthError;
use crate::services::auth::AuthService;
use crate::validate::{LoginForm, RegistrationForm, ValidationResult, validate_login, validate_registration};

/// What the auth page should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthView {
    /// Already signed in; navigation to the route has been requested.
    Redirect(Route),
    Form { disabled: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Invalid(ValidationResult),
    /// Another submission is still in flight.
    Busy,
    Failed(AuthError),
    Completed(Route),
}

pub struct AuthPageController {
    auth: Arc<AuthService>,
    navigator: Arc<dyn Navigator>,
    submitting: watch::Sender<bool>,
}

impl AuthPageController {
    pub fn new(auth: Arc<AuthService>, navigator: Arc<dyn Navigator>) -> Self {
        let (submitting, _) = watch::channel(false);
        Self { auth, navigator, submitting }
    }

    /// Redirect away if a session already exists, otherwise show the form.
    pub fn render(&self) -> AuthView {
        if self.auth.session().is_some() {
            self.navigator.navigate(Route::LANDING);
            return AuthView::Redirect(Route::LANDING);
        }
        AuthView::Form { disabled: self.is_submitting() }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        *self.submitting.borrow()
    }

    #[must_use]
    pub fn watch_submitting(&self) -> watch::Receiver<bool> {
        self.submitting.subscribe()
    }

    pub async fn submit_login(&self, form: &LoginForm) -> SubmitOutcome {
        let validation = validate_login(form);
        if !validation.is_valid() {
            return SubmitOutcome::Invalid(validation);
        }
        let Some(_guard) = self.begin() else {
            return SubmitOutcome::Busy;
        };
        let result = self.auth.sign_in(&form.email, &form.password).await;
        self.finish(result)
    }

    pub async fn submit_registration(&self, form: &RegistrationForm) -> SubmitOutcome {
        let validation = validate_registration(form);
        if !validation.is_valid() {
            return SubmitOutcome::Invalid(validation);
        }
        let Some(_guard) = self.begin() else {
            return SubmitOutcome::Busy;
        };
        let result = self.auth.sign_up(&form.email, &form.password, &form.full_name).await;
        self.finish(result)
    }

    fn begin(&self) -> Option<SubmitGuard<'_>> {
        let started = self.submitting.send_if_modified(|flag| {
            if *flag {
                return false;
            }
            *flag = true;
            true
        });
        if !started {
            debug!("duplicate submit ignored");
            return None;
        }
        Some(SubmitGuard { flag: &self.submitting })
    }

    fn finish(&self, result: Result<(), AuthError>) -> SubmitOutcome {
        match result {
            Ok(()) => {
                self.navigator.navigate(Route::LANDING);
                SubmitOutcome::Completed(Route::LANDING)
            }
            Err(e) => SubmitOutcome::Failed(e),
        }
    }
}

/// Clears the submitting flag when dropped.
struct SubmitGuard<'a> {
    flag: &'a watch::Sender<bool>,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.send_replace(false);
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
