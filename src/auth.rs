// File: ./src/auth.rs
//! Demo login. Credentials are kept in plain JSON on the device; this is a
//! convenience gate for the app, not a security boundary.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

const DEMO_EMAIL: &str = "demo@kino.no";
const DEMO_PASSWORD: &str = "passord123";
const TEST_USER: &str = "user1";
const TEST_PASSWORD: &str = "pass123";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    MissingField,
    InvalidEmail,
    PasswordTooShort,
    PasswordMismatch,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::MissingField => write!(f, "Fill in all fields."),
            RegistrationError::InvalidEmail => write!(f, "The email address does not look valid."),
            RegistrationError::PasswordTooShort => {
                write!(f, "Password must be at least {} characters.", MIN_PASSWORD_LEN)
            }
            RegistrationError::PasswordMismatch => write!(f, "Passwords do not match."),
        }
    }
}

impl std::error::Error for RegistrationError {}

pub struct AuthStorage;

impl AuthStorage {
    pub fn save_user(ctx: &dyn AppContext, email: &str, password: &str) -> Result<()> {
        let path = ctx.get_auth_path()?;
        LocalStorage::write_json(
            &path,
            &StoredUser {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
    }

    /// The registered user, if any. A damaged file counts as no user.
    pub fn get_user(ctx: &dyn AppContext) -> Option<StoredUser> {
        let path = ctx.get_auth_path().ok()?;
        match LocalStorage::read_json::<StoredUser>(&path) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Ignoring unreadable login file: {:#}", e);
                None
            }
        }
    }
}

/// Accepts the demo account, the test user, or the locally registered user.
pub fn check_login(ctx: &dyn AppContext, identifier: &str, password: &str) -> bool {
    let id = identifier.trim();

    let demo = id.eq_ignore_ascii_case(DEMO_EMAIL) && password == DEMO_PASSWORD;
    let test_user = id.eq_ignore_ascii_case(TEST_USER) && password == TEST_PASSWORD;
    let registered = AuthStorage::get_user(ctx)
        .is_some_and(|u| id.eq_ignore_ascii_case(&u.email) && password == u.password);

    demo || test_user || registered
}

pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), RegistrationError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(RegistrationError::MissingField);
    }
    if !email.contains('@') {
        return Err(RegistrationError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegistrationError::PasswordTooShort);
    }
    if password != confirm {
        return Err(RegistrationError::PasswordMismatch);
    }
    Ok(())
}

/// Validates and stores a new local user.
pub fn register(ctx: &dyn AppContext, email: &str, password: &str, confirm: &str) -> Result<()> {
    validate_registration(email, password, confirm)?;
    AuthStorage::save_user(ctx, email.trim(), password)
}

/// Whether a "forgot password" request names something we could send a link to.
/// Nothing is actually sent.
pub fn validate_reset_target(ctx: &dyn AppContext, input: &str) -> bool {
    let e = input.trim();
    if e.is_empty() {
        return false;
    }
    e.contains('@')
        || e.eq_ignore_ascii_case(TEST_USER)
        || AuthStorage::get_user(ctx).is_some_and(|u| u.email.eq_ignore_ascii_case(e))
}
