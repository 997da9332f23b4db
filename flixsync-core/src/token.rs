//! Signed sync tokens exchanged between the two origins
//!
//! A sync token is a short-lived HS256 JWT asserting that a specific
//! identity just authenticated on the issuing site. The receiving origin
//! verifies the signature and window, then re-derives trust from its own
//! lookup in the shared identity store before minting a session.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, SharedSecret, SiteId};

/// Default validity window for sync tokens, in seconds
pub const TOKEN_VALIDITY_SECS: i64 = 120;

/// Clock-skew leeway applied during validation, in seconds
const VALIDATION_LEEWAY_SECS: u64 = 5;

/// Claims carried by a sync token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTokenClaims {
    /// Token id; the replay-cache key on the redeeming origin
    pub jti: String,

    /// The shared identity id
    pub sub: String,

    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Site the user authenticated on
    pub iss: SiteId,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A signed sync token in its encoded form
#[derive(Debug, Clone)]
pub struct SyncToken {
    encoded: String,
    claims: SyncTokenClaims,
}

impl SyncToken {
    /// Create and sign a new sync token
    pub fn create(
        user_id: &str,
        email: &str,
        username: Option<String>,
        source: SiteId,
        validity: Duration,
        secret: &SharedSecret,
    ) -> Result<Self> {
        let now = Utc::now();
        let claims = SyncTokenClaims {
            jti: Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            email: email.to_string(),
            username,
            iss: source,
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
        };

        let encoded = encode(&Header::default(), &claims, &secret.encoding_key())?;

        Ok(Self { encoded, claims })
    }

    /// Verify an encoded token's signature and expiry, returning its claims
    pub fn verify(encoded: &str, secret: &SharedSecret) -> Result<SyncTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = VALIDATION_LEEWAY_SECS;

        decode::<SyncTokenClaims>(encoded, &secret.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::ExpiredToken,
                ErrorKind::InvalidSignature => Error::InvalidSignature,
                _ => Error::InvalidToken(e.to_string()),
            })
    }

    /// Get the encoded JWT
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Get the token claims
    pub fn claims(&self) -> &SyncTokenClaims {
        &self.claims
    }
}
