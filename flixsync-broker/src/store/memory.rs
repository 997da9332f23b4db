//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use super::{
    Identity, IdentityId, IdentityStore, ProfileFields, RedeemedToken, ReplayCache, StoreResult,
};
use crate::error::SyncError;
use crate::session::SessionId;

/// In-memory identity store
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<IdentityId, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn find_by_id(&self, id: &IdentityId) -> StoreResult<Option<Identity>> {
        Ok(self.identities.read().unwrap().get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let normalized = email.to_lowercase();
        let identities = self.identities.read().unwrap();
        Ok(identities
            .values()
            .find(|i| i.email == normalized)
            .cloned())
    }

    fn find_by_id_and_email(
        &self,
        id: &IdentityId,
        email: &str,
    ) -> StoreResult<Option<Identity>> {
        let normalized = email.to_lowercase();
        let identities = self.identities.read().unwrap();
        // The pair must match one row; a mismatched pair is never matched
        // to either identity
        Ok(identities
            .get(id)
            .filter(|i| i.email == normalized)
            .cloned())
    }

    fn upsert_identity(
        &self,
        id: &IdentityId,
        email: &str,
        fields: ProfileFields,
    ) -> StoreResult<Identity> {
        let normalized = email.to_lowercase();
        let mut identities = self.identities.write().unwrap();

        // Username uniqueness is a store-level constraint; both origins
        // can race on profile completion
        if let Some(username) = &fields.username {
            let taken = identities
                .values()
                .any(|i| i.id != *id && i.username.as_deref() == Some(username.as_str()));
            if taken {
                return Err(SyncError::UsernameTaken);
            }
        }

        let identity = match identities.get_mut(id) {
            Some(existing) => {
                existing.email = normalized;
                if let Some(username) = fields.username {
                    existing.username = Some(username);
                }
                if let Some(hash) = fields.credential_hash {
                    existing.credential_hash = Some(hash);
                }
                if let Some(country) = fields.country {
                    existing.country = Some(country);
                }
                if let Some(avatar_url) = fields.avatar_url {
                    existing.avatar_url = Some(avatar_url);
                }
                existing.clone()
            }
            None => {
                let identity = Identity {
                    id: id.clone(),
                    email: normalized,
                    username: fields.username,
                    credential_hash: fields.credential_hash,
                    country: fields.country,
                    avatar_url: fields.avatar_url,
                    created_at: Utc::now(),
                };
                identities.insert(id.clone(), identity.clone());
                identity
            }
        };

        Ok(identity)
    }

    fn delete_identity(&self, id: &IdentityId) -> StoreResult<()> {
        self.identities.write().unwrap().remove(id);
        Ok(())
    }
}

/// In-memory replay cache for redeemed sync tokens
pub struct InMemoryReplayCache {
    redeemed: RwLock<HashMap<String, RedeemedToken>>,
}

impl InMemoryReplayCache {
    pub fn new() -> Self {
        Self {
            redeemed: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryReplayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn record(&self, jti: &str, session_id: &SessionId) -> StoreResult<()> {
        self.redeemed.write().unwrap().insert(
            jti.to_string(),
            RedeemedToken {
                jti: jti.to_string(),
                session_id: session_id.clone(),
                redeemed_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn lookup(&self, jti: &str) -> StoreResult<Option<RedeemedToken>> {
        Ok(self.redeemed.read().unwrap().get(jti).cloned())
    }

    fn cleanup_expired(&self, max_age_secs: i64) -> StoreResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::seconds(max_age_secs);
        let mut redeemed = self.redeemed.write().unwrap();
        let before = redeemed.len();
        redeemed.retain(|_, t| t.redeemed_at > cutoff);
        Ok((before - redeemed.len()) as u64)
    }
}
