//! Native session issuance
//!
//! Each origin mints and validates its own opaque sessions; a session
//! from one origin is never honored by the other. The sync layer depends
//! only on the `SessionIssuer` trait, never on a concrete auth stack.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flixsync_core::SiteId;

use crate::store::{IdentityId, StoreResult};

/// Default session lifetime in days
pub const SESSION_TTL_DAYS: i64 = 30;

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// An origin-scoped authentication artifact
#[derive(Debug, Clone)]
pub struct NativeSession {
    pub id: SessionId,
    pub identity_id: IdentityId,
    /// Issuing origin; sessions are never valid anywhere else
    pub site: SiteId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NativeSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Trait for per-origin session issuance
pub trait SessionIssuer: Send + Sync {
    /// Mint a new session for an identity on this origin
    fn mint(&self, identity_id: &IdentityId) -> StoreResult<NativeSession>;

    /// Validate a session id; unknown or expired sessions yield None
    fn validate(&self, session_id: &SessionId) -> StoreResult<Option<NativeSession>>;

    /// Destroy a session
    fn destroy(&self, session_id: &SessionId) -> StoreResult<()>;

    /// Destroy every session bound to an identity (account deletion)
    fn destroy_all(&self, identity_id: &IdentityId) -> StoreResult<u64>;
}

impl<T: SessionIssuer + ?Sized> SessionIssuer for Arc<T> {
    fn mint(&self, identity_id: &IdentityId) -> StoreResult<NativeSession> {
        (**self).mint(identity_id)
    }

    fn validate(&self, session_id: &SessionId) -> StoreResult<Option<NativeSession>> {
        (**self).validate(session_id)
    }

    fn destroy(&self, session_id: &SessionId) -> StoreResult<()> {
        (**self).destroy(session_id)
    }

    fn destroy_all(&self, identity_id: &IdentityId) -> StoreResult<u64> {
        (**self).destroy_all(identity_id)
    }
}

/// In-memory session issuer
pub struct InMemorySessionIssuer {
    site: SiteId,
    ttl: Duration,
    sessions: RwLock<HashMap<SessionId, NativeSession>>,
}

impl InMemorySessionIssuer {
    pub fn new(site: SiteId) -> Self {
        Self::with_ttl(site, Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_ttl(site: SiteId, ttl: Duration) -> Self {
        Self {
            site,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl SessionIssuer for InMemorySessionIssuer {
    fn mint(&self, identity_id: &IdentityId) -> StoreResult<NativeSession> {
        let now = Utc::now();
        let session = NativeSession {
            id: SessionId(Uuid::new_v4().to_string()),
            identity_id: identity_id.clone(),
            site: self.site,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn validate(&self, session_id: &SessionId) -> StoreResult<Option<NativeSession>> {
        let expired = {
            let sessions = self.sessions.read().unwrap();
            match sessions.get(session_id) {
                Some(session) if session.is_expired() => true,
                Some(session) => return Ok(Some(session.clone())),
                None => return Ok(None),
            }
        };
        if expired {
            self.sessions.write().unwrap().remove(session_id);
        }
        Ok(None)
    }

    fn destroy(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(session_id);
        Ok(())
    }

    fn destroy_all(&self, identity_id: &IdentityId) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.identity_id != *identity_id);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str) -> IdentityId {
        IdentityId(id.to_string())
    }

    #[test]
    fn test_session_lifecycle() {
        let issuer = InMemorySessionIssuer::new(SiteId::Rockflix);

        let session = issuer.mint(&identity("u-1")).unwrap();
        assert_eq!(session.site, SiteId::Rockflix);
        assert!(issuer.validate(&session.id).unwrap().is_some());

        issuer.destroy(&session.id).unwrap();
        assert!(issuer.validate(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_expired_session_invalid() {
        let issuer = InMemorySessionIssuer::with_ttl(SiteId::Rockflix, Duration::seconds(-1));

        let session = issuer.mint(&identity("u-1")).unwrap();
        assert!(issuer.validate(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_destroy_all_scoped_to_identity() {
        let issuer = InMemorySessionIssuer::new(SiteId::Talkflix);

        let s1 = issuer.mint(&identity("u-1")).unwrap();
        let s2 = issuer.mint(&identity("u-1")).unwrap();
        let other = issuer.mint(&identity("u-2")).unwrap();

        assert_eq!(issuer.destroy_all(&identity("u-1")).unwrap(), 2);
        assert!(issuer.validate(&s1.id).unwrap().is_none());
        assert!(issuer.validate(&s2.id).unwrap().is_none());
        assert!(issuer.validate(&other.id).unwrap().is_some());
    }
}
