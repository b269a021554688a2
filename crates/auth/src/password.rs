//! One-way password hashing.

use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(pub String);

/// Opaque hash + verify capability.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Returns false for a wrong password *and* for an unparseable stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// Burn one verification's worth of work without a stored hash.
    ///
    /// Called on login for unknown usernames so both failure paths take
    /// comparable time.
    fn verify_dummy(&self, password: &str);
}

/// Argon2id with the crate's default parameters and a random salt per hash.
#[derive(Debug, Default)]
pub struct Argon2PasswordHasher {
    dummy: OnceLock<Option<String>>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordHashError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn verify_dummy(&self, password: &str) {
        let dummy = self
            .dummy
            .get_or_init(|| self.hash("ers-dummy-password").ok());
        if let Some(hash) = dummy {
            let _ = self.verify(password, hash);
        }
    }
}
