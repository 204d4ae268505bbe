//! HS256 session tokens.
//!
//! Issued after a successful phone verification. Claims are minimal: the
//! phone number as subject plus issued-at and expiry. There is no audience,
//! issuer, or not-before handling and no revocation list; a token is valid
//! until its expiry passes.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the verified E.164 phone number.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

impl Claims {
    /// Claims for a token issued now. `exp` is exactly `iat + ttl` in whole
    /// seconds.
    #[must_use]
    pub fn new(subject: &str, ttl: Duration) -> Self {
        let iat = unix_now();
        Self {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl.as_secs()),
        }
    }
}

/// Error returned when token signing fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to sign session token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// HMAC-SHA256 signing and verification keys derived from one shared secret.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionKeys {
    /// Build keys from the shared session secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is the only enforced claim. Zero leeway: a token that
        // expires at second N is rejected from second N on.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a set of claims into a compact token.
    ///
    /// # Errors
    /// Returns [`TokenError`] if HMAC signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        Ok(encode(&Header::default(), claims, &self.encoding)?)
    }

    /// Verify a session token and return its claims.
    ///
    /// Every failure mode (bad signature, malformed token, past expiry)
    /// yields `None`; callers treat them all as "not logged in".
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .ok()
            .map(|data| data.claims)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
