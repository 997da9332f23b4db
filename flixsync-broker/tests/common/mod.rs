//! Common test utilities for broker integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use flixsync_broker::{
    crypto, routes, AppState, IdentityId, IdentityStore, InMemoryIdentityStore,
    InMemoryReplayCache, InMemorySessionIssuer, ProfileFields,
};
use flixsync_core::{SharedSecret, SiteId};

pub const MOVIES_URL: &str = "https://rockflix.tv";
pub const COMMUNITY_URL: &str = "https://talkflix.org";

pub const SESSION_COOKIE: &str = "flixsync_session";

/// Create a test broker for the given site with a fresh identity store
pub fn create_test_server(site: SiteId) -> (TestServer, Arc<InMemoryIdentityStore>, SharedSecret) {
    let secret = SharedSecret::generate();
    let identities = Arc::new(InMemoryIdentityStore::new());
    let server = create_test_server_with(site, identities.clone(), secret.clone());
    (server, identities, secret)
}

/// Create a test broker sharing the given identity store and secret,
/// the way the two deployments share them in production
pub fn create_test_server_with(
    site: SiteId,
    identities: Arc<InMemoryIdentityStore>,
    secret: SharedSecret,
) -> TestServer {
    let state = Arc::new(AppState::new(
        site,
        MOVIES_URL.to_string(),
        COMMUNITY_URL.to_string(),
        secret,
        identities,
        InMemorySessionIssuer::new(site),
        InMemoryReplayCache::new(),
    ));

    let app = routes::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Seed an identity with a completed profile and password
pub fn seed_identity(
    identities: &InMemoryIdentityStore,
    id: &str,
    email: &str,
    username: &str,
    password: &str,
) {
    let hash = crypto::hash_password(password).expect("Failed to hash password");
    identities
        .upsert_identity(
            &IdentityId(id.to_string()),
            email,
            ProfileFields {
                username: Some(username.to_string()),
                credential_hash: Some(hash),
                ..Default::default()
            },
        )
        .expect("Failed to seed identity");
}

/// Log in and return the session cookie value
pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "pass": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}
