//! Cross-domain sync endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use flixsync_core::SiteId;

use crate::error::SyncError;
use crate::exchange;
use crate::notifier;
use crate::session::SessionIssuer;
use crate::state::AppState;
use crate::store::{IdentityId, IdentityStore, ReplayCache};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPageParams {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub from: Option<String>,
}

/// GET /auth/cross-domain-sync
/// Loaded in a hidden iframe by the sibling origin. Returns a
/// script-only page that forwards the claim to the parent window and
/// writes the same-tab flag. Requires no authentication because it
/// asserts nothing trusted: receivers only ever re-check their own
/// session.
pub async fn cross_domain_sync_page<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    Query(params): Query<SyncPageParams>,
) -> Result<Html<String>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let user_id = params
        .user_id
        .filter(|s| !s.is_empty())
        .ok_or(SyncError::MissingParams)?;
    let email = params
        .email
        .filter(|s| !s.is_empty())
        .ok_or(SyncError::MissingParams)?;

    // Older callers put a raw hostname in `from`; the only legitimate
    // sender is the sibling site either way
    let from = params
        .from
        .as_deref()
        .and_then(SiteId::from_str)
        .unwrap_or_else(|| state.site.peer());

    Ok(Html(notifier::render_sync_page(
        &user_id, &email, from, state.site,
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncClaimRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct SyncClaimResponse {
    pub success: bool,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "syncToken", skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(rename = "exchangeUrl", skip_serializing_if = "Option::is_none")]
    pub exchange_url: Option<String>,
    pub message: String,
}

/// POST /auth/sync-from-{peer}
/// Inbound sync claim from the sibling origin. The pair is validated
/// against the shared identity store before anything is issued.
pub async fn sync_from_peer<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    Json(req): Json<SyncClaimRequest>,
) -> Result<Json<SyncClaimResponse>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let user_id = req
        .user_id
        .filter(|s| !s.is_empty())
        .ok_or(SyncError::MissingParams)?;
    let email = req
        .email
        .filter(|s| !s.is_empty())
        .ok_or(SyncError::MissingParams)?;

    let id = IdentityId(user_id);
    let identity = state
        .identities
        .find_by_id_and_email(&id, &email)?
        .ok_or(SyncError::IdentityNotFound)?;

    match state.site {
        // Movies side: hand back a signed token the client redeems for a
        // local session
        SiteId::Rockflix => {
            let token = exchange::issue_token(
                &state.identities,
                &state.secret,
                state.site.peer(),
                identity.id.as_str(),
                &identity.email,
                state.token_validity_secs,
            )?;

            Ok(Json(SyncClaimResponse {
                success: true,
                user_id: Some(identity.id.0.clone()),
                email: Some(identity.email.clone()),
                sync_token: Some(token.encoded().to_string()),
                exchange_url: Some(format!(
                    "/auth/exchange-sync-token?token={}",
                    urlencoding::encode(token.encoded())
                )),
                message: "Sync token generated. Call the exchange URL to create a session."
                    .to_string(),
            }))
        }
        // Community side: both origins share the identity store, so a
        // verified pair is acknowledgment enough
        SiteId::Talkflix => Ok(Json(SyncClaimResponse {
            success: true,
            user_id: Some(identity.id.0.clone()),
            email: Some(identity.email.clone()),
            sync_token: None,
            exchange_url: None,
            message: "User verified. Client should refresh its local session.".to_string(),
        })),
    }
}

#[derive(Serialize)]
pub struct SyncToPeerResponse {
    pub success: bool,
    #[serde(rename = "syncUrl")]
    pub sync_url: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub message: String,
}

/// POST /auth/sync-to-{peer}
/// Requires a valid local session; returns the URL the client loads in a
/// hidden iframe. The iframe is detached after a few seconds whether or
/// not it delivered anything.
pub async fn sync_to_peer<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
) -> Result<Json<SyncToPeerResponse>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let session = super::auth::get_session_from_cookies(&cookies, &state.sessions)
        .ok_or(SyncError::NotAuthenticated)?;

    let identity = state
        .identities
        .find_by_id(&session.identity_id)?
        .ok_or(SyncError::IdentityNotFound)?;

    let sync_url = notifier::sync_page_url(
        state.peer_url(),
        identity.id.as_str(),
        &identity.email,
        state.site,
    );

    Ok(Json(SyncToPeerResponse {
        success: true,
        sync_url,
        user_id: identity.id.0.clone(),
        email: identity.email.clone(),
        message: format!(
            "Load this URL in a hidden iframe and detach it after {} seconds.",
            notifier::IFRAME_DETACH_SECS
        ),
    }))
}

#[derive(Deserialize)]
pub struct ExchangeRequest {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct ExchangeResponse {
    pub success: bool,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// POST /auth/exchange-sync-token
/// Redeem a sync token for a native session on this origin. The token
/// may arrive in the query string (the exchangeUrl form) or in the body.
pub async fn exchange_sync_token<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
    Query(query): Query<ExchangeRequest>,
    body: Option<Json<ExchangeRequest>>,
) -> Result<Json<ExchangeResponse>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let token = body
        .and_then(|Json(req)| req.token)
        .or(query.token)
        .filter(|s| !s.is_empty())
        .ok_or(SyncError::MissingParams)?;

    let session = exchange::redeem_token(
        &state.identities,
        &state.sessions,
        &state.replay,
        &state.secret,
        &token,
        state.token_validity_secs,
    )?;

    super::auth::set_session_cookie(&cookies, &session.id.0);

    Ok(Json(ExchangeResponse {
        success: true,
        user_id: session.identity_id.0.clone(),
    }))
}
