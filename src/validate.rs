//! Credential form validation.
//!
//! Pure functions: no I/O, no logging. Each form has a whole-form check used
//! on submit and a per-field check used while the user types. Messages are
//! the exact strings the forms display.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

pub const EMAIL_DOMAIN: &str = "@dynalab.com.ar";
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_FULL_NAME_LEN: usize = 2;

pub const INVALID_EMAIL: &str = "Invalid email";
pub const LOGIN_DOMAIN: &str = "Invalid input: must end with \"@dynalab.com.ar\"";
pub const LOGIN_PASSWORD_TOO_SHORT: &str = "String must contain at least 8 character(s)";
pub const REGISTER_FULL_NAME_TOO_SHORT: &str = "Nombre completo debe tener al menos 2 caracteres";
pub const REGISTER_DOMAIN: &str = "El email debe ser del dominio @dynalab.com.ar";
pub const REGISTER_PASSWORD_TOO_SHORT: &str = "La contraseña debe tener al menos 8 caracteres";

// Leading-dot and double-dot rules are checked separately; `regex` has no
// lookahead. Classes are spelled out in ASCII: `(?i)` would fold `ſ` and the
// Kelvin sign into `[A-Z]`.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern should compile")
});

// =============================================================================
// FORMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Email,
    Password,
}

impl Field {
    /// Form field name as the view binds it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// One message per failing field; empty when the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub field_errors: BTreeMap<Field, String>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    #[must_use]
    pub fn error(&self, field: Field) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }

    fn check(&mut self, field: Field, message: Option<&'static str>) {
        if let Some(message) = message {
            self.field_errors.insert(field, message.to_owned());
        }
    }
}

// =============================================================================
// VALIDATORS
// =============================================================================

#[must_use]
pub fn validate_login(form: &LoginForm) -> ValidationResult {
    let mut result = ValidationResult::default();
    for field in [Field::Email, Field::Password] {
        result.check(field, login_message(form, field));
    }
    result
}

#[must_use]
pub fn validate_registration(form: &RegistrationForm) -> ValidationResult {
    let mut result = ValidationResult::default();
    for field in [Field::FullName, Field::Email, Field::Password] {
        result.check(field, registration_message(form, field));
    }
    result
}

/// Message for a single login field, or `None` if it passes. `FullName` is
/// not part of the login form and always passes.
#[must_use]
pub fn login_field_error(form: &LoginForm, field: Field) -> Option<String> {
    login_message(form, field).map(str::to_owned)
}

/// Message for a single registration field, or `None` if it passes.
#[must_use]
pub fn registration_field_error(form: &RegistrationForm, field: Field) -> Option<String> {
    registration_message(form, field).map(str::to_owned)
}

fn login_message(form: &LoginForm, field: Field) -> Option<&'static str> {
    match field {
        Field::FullName => None,
        Field::Email => email_message(&form.email, LOGIN_DOMAIN),
        Field::Password => min_len(&form.password, MIN_PASSWORD_LEN, LOGIN_PASSWORD_TOO_SHORT),
    }
}

fn registration_message(form: &RegistrationForm, field: Field) -> Option<&'static str> {
    match field {
        Field::FullName => min_len(&form.full_name, MIN_FULL_NAME_LEN, REGISTER_FULL_NAME_TOO_SHORT),
        Field::Email => email_message(&form.email, REGISTER_DOMAIN),
        Field::Password => min_len(&form.password, MIN_PASSWORD_LEN, REGISTER_PASSWORD_TOO_SHORT),
    }
}

/// Domain failure takes precedence over syntax failure.
fn email_message(email: &str, domain_message: &'static str) -> Option<&'static str> {
    if !email.ends_with(EMAIL_DOMAIN) {
        return Some(domain_message);
    }
    if !is_email(email) {
        return Some(INVALID_EMAIL);
    }
    None
}

fn min_len(value: &str, min: usize, message: &'static str) -> Option<&'static str> {
    (browser_len(value) < min).then_some(message)
}

/// String length as a browser counts it (UTF-16 code units).
#[must_use]
pub fn browser_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[must_use]
pub fn is_email(value: &str) -> bool {
    !value.starts_with('.') && !value.contains("..") && EMAIL.is_match(value)
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
