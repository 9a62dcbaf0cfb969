//! Signed, expiring tokens for email confirmation and API authentication.
//!
//! Tokens are HS512 JWTs keyed by the application secret. Verification
//! collapses every failure (bad signature, expired, wrong kind) into a
//! negative answer; callers only learn whether the token is good.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{CoreError, Result};

/// Default lifetime of a confirmation token (one hour)
pub const CONFIRMATION_TTL_SECS: i64 = 3600;

/// Default lifetime of an API auth token (one hour)
pub const AUTH_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
struct ConfirmClaims {
    confirm: i64,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaims {
    id: i64,
    iat: i64,
    exp: i64,
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Token proving control of the email address of `user_id`.
    pub fn issue_confirmation(&self, user_id: i64, expires_in: Duration) -> Result<String> {
        let now = Utc::now();
        self.sign(&ConfirmClaims {
            confirm: user_id,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        })
    }

    /// True iff `token` is a live confirmation token for `user_id`.
    pub fn verify_confirmation(&self, token: &str, user_id: i64) -> bool {
        match self.open::<ConfirmClaims>(token) {
            Some(claims) => claims.confirm == user_id,
            None => false,
        }
    }

    /// Bearer token standing in for email + password on API calls.
    pub fn issue_auth(&self, user_id: i64, expires_in: Duration) -> Result<String> {
        let now = Utc::now();
        self.sign(&AuthClaims {
            id: user_id,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        })
    }

    /// User id carried by a live auth token.
    pub fn verify_auth(&self, token: &str) -> Option<i64> {
        self.open::<AuthClaims>(token).map(|claims| claims.id)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key)
            .map_err(|e| CoreError::token(e.to_string()))
    }

    fn open<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        match decode::<T>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Token rejected: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
