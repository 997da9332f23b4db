//! Native authentication endpoints
//!
//! Each origin issues its own sessions. Sync only ever triggers these
//! same flows; it never bypasses them.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::crypto::verify_password;
use crate::error::SyncError;
use crate::notifier;
use crate::session::{NativeSession, SessionId, SessionIssuer};
use crate::state::AppState;
use crate::store::{IdentityStore, ReplayCache};

pub const SESSION_COOKIE: &str = "flixsync_session";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub pass: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    /// URL the client loads in a hidden iframe to notify the peer origin
    #[serde(rename = "syncUrl", skip_serializing_if = "Option::is_none")]
    pub sync_url: Option<String>,
}

/// POST /auth/login
pub async fn login<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let identity = state
        .identities
        .find_by_email(&req.email)?
        .ok_or(SyncError::InvalidCredentials)?;

    let hash = identity
        .credential_hash
        .as_deref()
        .ok_or(SyncError::InvalidCredentials)?;

    let valid =
        verify_password(&req.pass, hash).map_err(|e| SyncError::Internal(e.to_string()))?;
    if !valid {
        return Err(SyncError::InvalidCredentials);
    }

    let session = state.sessions.mint(&identity.id)?;
    set_session_cookie(&cookies, &session.id.0);

    // Best-effort server-side push; sync failures never block the login
    let client = state.http.clone();
    let peer_base = state.peer_url().to_string();
    let from = state.site;
    let user_id = identity.id.as_str().to_string();
    let email = identity.email.clone();
    tokio::spawn(async move {
        notifier::push_claim(&client, &peer_base, from, &user_id, &email).await;
    });

    let sync_url =
        notifier::sync_page_url(state.peer_url(), identity.id.as_str(), &identity.email, state.site);

    Ok(Json(LoginResponse {
        success: true,
        userid: Some(identity.id.0.clone()),
        sync_url: Some(sync_url),
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /auth/logout
pub async fn logout<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
) -> Json<LogoutResponse>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    if let Some(session) = get_session_from_cookies(&cookies, &state.sessions) {
        let _ = state.sessions.destroy(&session.id);
    }

    clear_session_cookie(&cookies);

    Json(LogoutResponse { success: true })
}

#[derive(Serialize)]
pub struct CheckResponse {
    pub authenticated: bool,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// GET /auth/check
/// The authoritative session re-check the reconciler's refresher hits
pub async fn check<I, S, R>(
    State(state): State<Arc<AppState<I, S, R>>>,
    cookies: Cookies,
) -> Result<(StatusCode, Json<CheckResponse>), SyncError>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    let Some(session) = get_session_from_cookies(&cookies, &state.sessions) else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(CheckResponse {
                authenticated: false,
                user_id: None,
                email: None,
            }),
        ));
    };

    let email = state
        .identities
        .find_by_id(&session.identity_id)?
        .map(|i| i.email);

    Ok((
        StatusCode::OK,
        Json(CheckResponse {
            authenticated: true,
            user_id: Some(session.identity_id.0.clone()),
            email,
        }),
    ))
}

/// Helper to get the current session from cookies
pub fn get_session_from_cookies<S: SessionIssuer>(
    cookies: &Cookies,
    sessions: &S,
) -> Option<NativeSession> {
    cookies.get(SESSION_COOKIE).and_then(|c| {
        let session_id = SessionId(c.value().to_string());
        sessions.validate(&session_id).ok().flatten()
    })
}

/// Helper to set the session cookie
pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    use tower_cookies::Cookie;
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

/// Helper to clear the session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    use tower_cookies::Cookie;
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
