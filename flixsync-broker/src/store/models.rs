//! Data models for broker storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Stable identifier shared by both origins; never regenerated once
/// assigned
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(pub String);

impl IdentityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shared user identity, visible to both origins
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    /// None until profile completion
    pub username: Option<String>,
    /// None for OAuth-only identities
    pub credential_hash: Option<String>,
    pub country: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields applied on upsert; None leaves the stored value
/// unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub username: Option<String>,
    pub credential_hash: Option<String>,
    pub country: Option<String>,
    pub avatar_url: Option<String>,
}

/// Record of a redeemed sync token, keyed by token id
#[derive(Debug, Clone)]
pub struct RedeemedToken {
    pub jti: String,
    pub session_id: SessionId,
    pub redeemed_at: DateTime<Utc>,
}
