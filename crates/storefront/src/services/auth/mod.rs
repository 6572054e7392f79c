//! Admin authentication.
//!
//! There is exactly one admin account. Its username and argon2 password hash
//! come from configuration; nothing about it is stored in the database.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::AdminConfig;
use crate::models::CurrentAdmin;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Checks login attempts against the configured admin credential.
pub struct AdminAuth<'a> {
    config: &'a AdminConfig,
}

impl<'a> AdminAuth<'a> {
    /// Create a new authenticator.
    #[must_use]
    pub const fn new(config: &'a AdminConfig) -> Self {
        Self { config }
    }

    /// Verify a username and password.
    ///
    /// The password hash is checked even when the username is wrong so both
    /// failures take the same time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if either value is wrong.
    pub fn login(&self, username: &str, password: &str) -> Result<CurrentAdmin, AuthError> {
        let password_ok = verify_password(password, self.config.password_hash()).is_ok();
        let username_ok = username.trim() == self.config.username;

        if password_ok && username_ok {
            Ok(CurrentAdmin::new(&self.config.username))
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2id, producing a PHC string for
/// `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` for short passwords and
/// `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is unparseable or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn admin(password: &str) -> AdminConfig {
        AdminConfig {
            username: "atiga".to_string(),
            password_hash: SecretString::from(hash_password(password).unwrap()),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("jati-jepara-2024").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("jati-jepara-2024", &hash).is_ok());
        assert!(matches!(
            verify_password("rotan-sintetis", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            hash_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_admin_login() {
        let config = admin("kursi-makan-123");
        let auth = AdminAuth::new(&config);

        let current = auth.login("atiga", "kursi-makan-123").unwrap();
        assert_eq!(current.username, "atiga");

        assert!(auth.login("atiga", "wrong-password").is_err());
        assert!(auth.login("someone", "kursi-makan-123").is_err());
    }
}
