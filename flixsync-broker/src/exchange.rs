//! Sync token issuance and redemption
//!
//! Issuance asserts that an identity present in the shared store just
//! authenticated on the source site. Redemption verifies the token,
//! re-validates the claimed pair against the store, and mints a native
//! session on this origin. Redemption is idempotent: retrying a consumed
//! token returns the session minted the first time, and a replayed token
//! whose session is gone is rejected rather than minting a second one.

use chrono::{Duration, Utc};

use flixsync_core::{SharedSecret, SiteId, SyncToken};

use crate::error::SyncError;
use crate::session::{NativeSession, SessionIssuer};
use crate::store::{IdentityId, IdentityStore, ReplayCache};

/// Replay entries are kept for this many validity windows
const REPLAY_TTL_FACTOR: i64 = 2;

/// Issue a signed sync token for an identity confirmed in the shared
/// store
pub fn issue_token<I: IdentityStore>(
    identities: &I,
    secret: &SharedSecret,
    source: SiteId,
    user_id: &str,
    email: &str,
    validity_secs: i64,
) -> Result<SyncToken, SyncError> {
    let id = IdentityId(user_id.to_string());
    let identity = identities
        .find_by_id_and_email(&id, email)?
        .ok_or(SyncError::IdentityNotFound)?;

    let token = SyncToken::create(
        identity.id.as_str(),
        &identity.email,
        identity.username.clone(),
        source,
        Duration::seconds(validity_secs),
        secret,
    )?;

    Ok(token)
}

/// Redeem a sync token for a native session on this origin
pub fn redeem_token<I, S, R>(
    identities: &I,
    sessions: &S,
    replay: &R,
    secret: &SharedSecret,
    encoded: &str,
    validity_secs: i64,
) -> Result<NativeSession, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let claims = SyncToken::verify(encoded, secret)?;

    // The issue time must sit inside the window too; exp alone would
    // trust whatever the issuer put there
    let age = Utc::now().timestamp() - claims.iat;
    if age > validity_secs {
        return Err(SyncError::ExpiredToken);
    }

    if let Some(prior) = replay.lookup(&claims.jti)? {
        // A retried redemption gets the original session back; a replay
        // whose session is gone never mints a fresh one
        if let Some(session) = sessions.validate(&prior.session_id)? {
            return Ok(session);
        }
        return Err(SyncError::AlreadyRedeemed);
    }

    // The token is advisory until the pair checks out in the shared store
    let id = IdentityId(claims.sub.clone());
    let identity = identities
        .find_by_id_and_email(&id, &claims.email)?
        .ok_or(SyncError::IdentityNotFound)?;

    let session = sessions.mint(&identity.id)?;
    replay.record(&claims.jti, &session.id)?;
    replay.cleanup_expired(validity_secs * REPLAY_TTL_FACTOR)?;

    Ok(session)
}
