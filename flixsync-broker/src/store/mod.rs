//! Storage abstractions for the broker

pub mod models;

mod memory;
mod sqlite;

pub use memory::{InMemoryIdentityStore, InMemoryReplayCache};
pub use models::*;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use crate::error::SyncError;
use crate::session::SessionId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, SyncError>;

/// Trait for the shared identity table both origins read and write
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by id
    fn find_by_id(&self, id: &IdentityId) -> StoreResult<Option<Identity>>;

    /// Look up an identity by email address
    fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Validate a sync claim: the id and email must belong to the same
    /// identity, never matched separately
    fn find_by_id_and_email(&self, id: &IdentityId, email: &str)
        -> StoreResult<Option<Identity>>;

    /// Idempotent create-or-update keyed strictly by id. An unknown id is
    /// a new identity even when the email matches an existing row.
    fn upsert_identity(
        &self,
        id: &IdentityId,
        email: &str,
        fields: ProfileFields,
    ) -> StoreResult<Identity>;

    /// Explicit account deletion. Callers must also destroy the
    /// identity's sessions on both origins.
    fn delete_identity(&self, id: &IdentityId) -> StoreResult<()>;
}

/// Trait for the redeemed-token replay cache
pub trait ReplayCache: Send + Sync {
    /// Record a redemption keyed by token id
    fn record(&self, jti: &str, session_id: &SessionId) -> StoreResult<()>;

    /// Look up a prior redemption
    fn lookup(&self, jti: &str) -> StoreResult<Option<RedeemedToken>>;

    /// Delete entries older than the given age. The retention must be at
    /// least the token validity window.
    fn cleanup_expired(&self, max_age_secs: i64) -> StoreResult<u64>;
}

impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn find_by_id(&self, id: &IdentityId) -> StoreResult<Option<Identity>> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        (**self).find_by_email(email)
    }

    fn find_by_id_and_email(
        &self,
        id: &IdentityId,
        email: &str,
    ) -> StoreResult<Option<Identity>> {
        (**self).find_by_id_and_email(id, email)
    }

    fn upsert_identity(
        &self,
        id: &IdentityId,
        email: &str,
        fields: ProfileFields,
    ) -> StoreResult<Identity> {
        (**self).upsert_identity(id, email, fields)
    }

    fn delete_identity(&self, id: &IdentityId) -> StoreResult<()> {
        (**self).delete_identity(id)
    }
}

impl<T: ReplayCache + ?Sized> ReplayCache for Arc<T> {
    fn record(&self, jti: &str, session_id: &SessionId) -> StoreResult<()> {
        (**self).record(jti, session_id)
    }

    fn lookup(&self, jti: &str) -> StoreResult<Option<RedeemedToken>> {
        (**self).lookup(jti)
    }

    fn cleanup_expired(&self, max_age_secs: i64) -> StoreResult<u64> {
        (**self).cleanup_expired(max_age_secs)
    }
}
