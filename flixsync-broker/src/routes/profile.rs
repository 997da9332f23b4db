//! Profile completion and account lifecycle endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::crypto::hash_password;
use crate::error::SyncError;
use crate::session::SessionIssuer;
use crate::state::AppState;
use crate::store::{IdentityStore, ProfileFields, ReplayCache};

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteProfileRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub country: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Serialize)]
pub struct SimpleResponse {
    pub success: bool,
}

/// POST /auth/complete-profile
/// Writes are keyed by the session's identity id; both origins can run
/// this concurrently, so username uniqueness is left to the store.
pub async fn complete_profile<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
    Json(req): Json<CompleteProfileRequest>,
) -> Result<Json<SimpleResponse>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let session = super::auth::get_session_from_cookies(&cookies, &state.sessions)
        .ok_or(SyncError::NotAuthenticated)?;

    let username = req
        .username
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SyncError::ValidationError("Username and password are required".into()))?;
    let password = req
        .password
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SyncError::ValidationError("Username and password are required".into()))?;

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(SyncError::PasswordTooShort);
    }

    let identity = state
        .identities
        .find_by_id(&session.identity_id)?
        .ok_or(SyncError::IdentityNotFound)?;

    let credential_hash =
        hash_password(&password).map_err(|e| SyncError::Internal(e.to_string()))?;

    state.identities.upsert_identity(
        &identity.id,
        &identity.email,
        ProfileFields {
            username: Some(username),
            credential_hash: Some(credential_hash),
            country: req.country,
            avatar_url: req.profile_picture_url,
        },
    )?;

    Ok(Json(SimpleResponse { success: true }))
}

/// POST /auth/account-cancel
/// Explicit account deletion: removes the shared identity row and every
/// local session bound to it. The peer origin drops its sessions the
/// next time they fail validation against the store.
pub async fn account_cancel<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
) -> Result<Json<SimpleResponse>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let session = super::auth::get_session_from_cookies(&cookies, &state.sessions)
        .ok_or(SyncError::NotAuthenticated)?;

    state.sessions.destroy_all(&session.identity_id)?;
    state.identities.delete_identity(&session.identity_id)?;
    super::auth::clear_session_cookie(&cookies);

    Ok(Json(SimpleResponse { success: true }))
}
