//! Salted password hashing with Argon2id.
//!
//! Plaintext only ever flows in: a [`Password`] can be hashed or checked
//! against a stored [`PasswordHash`], never read back.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use zeroize::Zeroize;

use crate::{CoreError, Result};

/// Plaintext password, zeroized on drop.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Stored PHC string: `$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash with a fresh random salt, so equal passwords never share a hash.
    pub fn generate(password: &Password) -> Result<Self> {
        if password.is_empty() {
            return Err(CoreError::password("Password cannot be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CoreError::password(format!("Password hashing failed: {}", e)))?;

        Ok(Self(hash.to_string()))
    }

    /// Wrap a hash loaded from storage.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        Self(stored.into())
    }

    /// Check a candidate password. A malformed stored hash never matches.
    pub fn verify(&self, password: &Password) -> bool {
        let parsed = match PhcHash::new(&self.0) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Unparseable password hash in storage: {}", e);
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
