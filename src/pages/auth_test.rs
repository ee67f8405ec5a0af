use super::*;
use crate::notify::Severity;
use crate::state::session::{SessionState, SessionStore};
use crate::testing::{FakeProvider, RecordingNavigator, RecordingNotifier, rejected, test_session};
use crate::validate::{Field, LOGIN_DOMAIN, REGISTER_FULL_NAME_TOO_SHORT};

struct Harness {
    provider: Arc<FakeProvider>,
    store: Arc<SessionStore>,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
    controller: Arc<AuthPageController>,
}

async fn harness(provider: Arc<FakeProvider>) -> Harness {
    let store = SessionStore::new();
    store.initialize(&*provider).await.unwrap();
    let notifier = RecordingNotifier::new();
    let navigator = RecordingNavigator::new();
    let auth = Arc::new(AuthService::new(provider.clone(), store.clone(), notifier.clone()));
    let controller = Arc::new(AuthPageController::new(auth, navigator.clone()));
    Harness { provider, store, notifier, navigator, controller }
}

fn login(email: &str, password: &str) -> LoginForm {
    LoginForm { email: email.into(), password: password.into() }
}

// =============================================================================
// render
// =============================================================================

#[tokio::test]
async fn render_shows_form_when_signed_out() {
    let h = harness(FakeProvider::new()).await;

    assert_eq!(h.controller.render(), AuthView::Form { disabled: false });
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn render_redirects_when_already_signed_in() {
    let h = harness(FakeProvider::signed_in(None)).await;

    assert_eq!(h.controller.render(), AuthView::Redirect(Route::Dashboard));
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_signs_in_and_navigates_once() {
    let h = harness(FakeProvider::new()).await;
    let mut flag = h.controller.watch_submitting();

    let outcome = h.controller.submit_login(&login("user@dynalab.com.ar", "12345678")).await;

    assert_eq!(outcome, SubmitOutcome::Completed(Route::Dashboard));
    assert_eq!(h.store.current(), Some(test_session(None)));
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
    assert!(h.notifier.shown().is_empty());
    assert!(!h.controller.is_submitting());
    // The flag went up and came back down.
    assert!(flag.has_changed().unwrap());
    assert!(!*flag.borrow_and_update());
}

#[tokio::test]
async fn login_foreign_domain_never_reaches_provider() {
    let h = harness(FakeProvider::new()).await;
    let flag = h.controller.watch_submitting();

    let outcome = h.controller.submit_login(&login("user@gmail.com", "12345678")).await;

    let SubmitOutcome::Invalid(result) = &outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    assert_eq!(result.error(Field::Email), Some(LOGIN_DOMAIN));
    assert_eq!(h.provider.calls(), vec!["current_session"]);
    assert!(!flag.has_changed().unwrap());
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn login_rejected_notifies_once_and_resets() {
    let h = harness(FakeProvider::new().reject_sign_in(rejected("Invalid login credentials"))).await;

    let outcome = h.controller.submit_login(&login("user@dynalab.com.ar", "wrongpass")).await;

    assert_eq!(outcome, SubmitOutcome::Failed(rejected("Invalid login credentials")));
    assert_eq!(h.store.state(), SessionState::Unauthenticated);
    assert!(!h.controller.is_submitting());
    assert!(h.navigator.routes().is_empty());
    let shown = h.notifier.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].severity, Severity::Error);
    assert_eq!(shown[0].description, "Invalid login credentials");
}

#[tokio::test]
async fn login_can_be_resubmitted_after_failure() {
    let h = harness(FakeProvider::new().reject_sign_in(AuthError::Network("offline".into()))).await;
    let form = login("user@dynalab.com.ar", "12345678");

    assert!(matches!(h.controller.submit_login(&form).await, SubmitOutcome::Failed(_)));
    assert!(matches!(h.controller.submit_login(&form).await, SubmitOutcome::Failed(_)));
    assert_eq!(h.notifier.shown().len(), 2);
}

#[tokio::test]
async fn duplicate_submit_while_in_flight_is_busy() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let h = harness(FakeProvider::new().hold_requests(gate.clone())).await;
    let form = login("user@dynalab.com.ar", "12345678");

    let controller = h.controller.clone();
    let first_form = form.clone();
    let first = tokio::spawn(async move { controller.submit_login(&first_form).await });

    let mut flag = h.controller.watch_submitting();
    flag.wait_for(|submitting| *submitting).await.unwrap();
    assert_eq!(h.controller.render(), AuthView::Form { disabled: true });
    assert_eq!(h.controller.submit_login(&form).await, SubmitOutcome::Busy);

    gate.notify_one();
    assert_eq!(first.await.unwrap(), SubmitOutcome::Completed(Route::Dashboard));
    assert!(!h.controller.is_submitting());
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
    assert_eq!(h.provider.calls(), vec!["current_session", "sign_in:user@dynalab.com.ar"]);
}

// =============================================================================
// registration
// =============================================================================

#[tokio::test]
async fn registration_short_name_never_reaches_provider() {
    let h = harness(FakeProvider::new()).await;
    let form = RegistrationForm { full_name: "A".into(), email: "x@dynalab.com.ar".into(), password: "longenough".into() };

    let outcome = h.controller.submit_registration(&form).await;

    let SubmitOutcome::Invalid(result) = &outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    assert_eq!(result.error(Field::FullName), Some(REGISTER_FULL_NAME_TOO_SHORT));
    assert_eq!(h.provider.calls(), vec!["current_session"]);
    assert!(!h.controller.is_submitting());
}

#[tokio::test]
async fn registration_success_passes_full_name_and_navigates() {
    let h = harness(FakeProvider::new()).await;
    let form = RegistrationForm { full_name: "Ana Gomez".into(), email: "ana@dynalab.com.ar".into(), password: "longenough".into() };

    let outcome = h.controller.submit_registration(&form).await;

    assert_eq!(outcome, SubmitOutcome::Completed(Route::Dashboard));
    assert_eq!(h.provider.calls().last().map(String::as_str), Some("sign_up:ana@dynalab.com.ar:Ana Gomez"));
    assert_eq!(h.notifier.shown().len(), 1);
    assert_eq!(h.notifier.shown()[0].severity, Severity::Info);
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn registration_rejected_reports_failure() {
    let h = harness(FakeProvider::new().reject_sign_up(rejected("User already registered"))).await;
    let form = RegistrationForm { full_name: "Ana Gomez".into(), email: "ana@dynalab.com.ar".into(), password: "longenough".into() };

    let outcome = h.controller.submit_registration(&form).await;

    assert_eq!(outcome, SubmitOutcome::Failed(rejected("User already registered")));
    assert!(!h.controller.is_submitting());
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.notifier.shown().len(), 1);
}
