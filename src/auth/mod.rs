//! Authentication
//!
//! Email/password accounts with Argon2 hashes, opaque bearer sessions,
//! a per-email failed-login throttle and single-use password reset tokens.
//!
//! Errors carry stable string codes (`invalid-email`, `wrong-password`, ...)
//! that clients use to pick a user-facing message.

pub mod manager;
pub mod password;
pub mod sessions;

pub use manager::{AuthManager, AuthPolicy, LoginRequest};
pub use password::{hash_password, verify_password, PasswordStrength};
pub use sessions::{LoginThrottle, Session, SessionStore};

use crate::storage::{Role, StoreError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum accepted password length (in characters)
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("No account for this email")]
    UserNotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Too many failed attempts, try again later")]
    TooManyRequests,

    #[error("This area is restricted to administrators")]
    AccessDenied,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Session is missing, invalid or expired")]
    InvalidSession,

    #[error("Reset token is invalid or expired")]
    InvalidResetToken,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable error code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "invalid-email",
            AuthError::UserNotFound => "user-not-found",
            AuthError::WrongPassword => "wrong-password",
            AuthError::TooManyRequests => "too-many-requests",
            AuthError::AccessDenied => "access-denied",
            AuthError::WeakPassword => "weak-password",
            AuthError::PasswordMismatch => "password-mismatch",
            AuthError::EmailInUse => "email-already-in-use",
            AuthError::InvalidSession => "invalid-session",
            AuthError::InvalidResetToken => "invalid-reset-token",
            AuthError::Hash(_) => "internal-error",
            AuthError::Store(_) => "internal-error",
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Which application a login comes from
///
/// The console only admits administrators; the client app admits everyone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Console,
    Client,
}

/// The identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"))
}

/// Check an email against the `something@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Normalize an email for lookups and throttling
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("amanda@salon.com"));
        assert!(is_valid_email("  carla@mail.com.br "));
        assert!(!is_valid_email("amanda"));
        assert!(!is_valid_email("amanda@salon"));
        assert!(!is_valid_email("a b@salon.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::InvalidEmail.code(), "invalid-email");
        assert_eq!(AuthError::TooManyRequests.code(), "too-many-requests");
        assert_eq!(AuthError::AccessDenied.code(), "access-denied");
    }

    #[test]
    fn test_audience_default_is_console() {
        assert_eq!(Audience::default(), Audience::Console);
        let parsed: Audience = serde_json::from_str("\"client\"").unwrap();
        assert_eq!(parsed, Audience::Client);
    }
}
