//! Tests for the authenticated sync-to endpoint

mod common;

use common::{create_test_server, login, seed_identity, COMMUNITY_URL, SESSION_COOKIE};
use flixsync_core::SiteId;
use serde_json::Value;

#[tokio::test]
async fn test_sync_to_peer_requires_session() {
    let (server, _, _) = create_test_server(SiteId::Rockflix);

    let response = server.post("/auth/sync-to-talkflix").await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_sync_to_peer_returns_sync_url() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let session = login(&server, "jane@example.com", "password1").await;

    let response = server
        .post("/auth/sync-to-talkflix")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["userId"], "u-42");
    assert_eq!(body["email"], "jane@example.com");

    let sync_url = body["syncUrl"].as_str().expect("No sync URL");
    assert!(sync_url.starts_with(&format!("{}/auth/cross-domain-sync?", COMMUNITY_URL)));
    assert!(sync_url.contains("userId=u-42"));
    assert!(sync_url.contains("email=jane%40example.com"));
    assert!(sync_url.contains("from=rockflix"));
}

#[tokio::test]
async fn test_bogus_session_cookie_rejected() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let response = server
        .post("/auth/sync-to-talkflix")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, "not-a-session"))
        .await;

    assert_eq!(response.status_code(), 401);
}
