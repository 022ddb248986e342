//! Password hashing and strength rating

use super::{AuthError, AuthResult, MIN_PASSWORD_LEN};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use serde::Serialize;

pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Coarse strength label shown while choosing a new password
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    /// Rate by length: under 6 is weak, under 10 medium, otherwise strong
    pub fn evaluate(password: &str) -> Self {
        let len = password.chars().count();
        if len < MIN_PASSWORD_LEN {
            PasswordStrength::Weak
        } else if len < 10 {
            PasswordStrength::Medium
        } else {
            PasswordStrength::Strong
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
        assert!(!verify_password("secret123", "not-a-hash"));
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(PasswordStrength::evaluate("abc"), PasswordStrength::Weak);
        assert_eq!(PasswordStrength::evaluate("abcdef"), PasswordStrength::Medium);
        assert_eq!(PasswordStrength::evaluate("abcdefghi"), PasswordStrength::Medium);
        assert_eq!(PasswordStrength::evaluate("abcdefghij"), PasswordStrength::Strong);
    }
}
