//! Shared-secret key material for sync token signing
//!
//! Both origins hold the same secret; a token signed by one can be
//! verified by the other without trusting the transport.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::{rngs::OsRng, RngCore};

use crate::{Error, Result};

/// Minimum secret length in bytes
pub const SECRET_LEN: usize = 32;

/// Symmetric signing key shared by the two cooperating origins
#[derive(Clone)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    /// Generate a new random secret
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a secret from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SECRET_LEN {
            return Err(Error::InvalidSecret(format!(
                "secret must be at least {} bytes",
                SECRET_LEN
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Encode as base64url (no padding)
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.bytes)
    }

    /// Decode from base64url
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw secret bytes (for storage)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log key material
        write!(f, "SharedSecret([redacted; {} bytes])", self.bytes.len())
    }
}
