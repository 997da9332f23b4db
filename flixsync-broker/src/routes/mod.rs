//! HTTP routes for the sync broker

mod auth;
mod profile;
mod sync;

pub use auth::SESSION_COOKIE;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::session::SessionIssuer;
use crate::state::AppState;
use crate::store::{IdentityStore, ReplayCache};

/// Create the router with all routes. The sync-from/sync-to paths are
/// named after the sibling site, matching what the peer deployment
/// calls.
pub fn create_router<I, S, R>(state: Arc<AppState<I, S, R>>) -> Router
where
    I: IdentityStore + 'static,
    S: SessionIssuer + 'static,
    R: ReplayCache + 'static,
{
    let peer = state.site.peer();

    Router::new()
        .route("/auth/cross-domain-sync", get(sync::cross_domain_sync_page))
        .route(&format!("/auth/sync-from-{}", peer), post(sync::sync_from_peer))
        .route(&format!("/auth/sync-to-{}", peer), post(sync::sync_to_peer))
        .route("/auth/exchange-sync-token", post(sync::exchange_sync_token))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check))
        .route("/auth/complete-profile", post(profile::complete_profile))
        .route("/auth/account-cancel", post(profile::account_cancel))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
