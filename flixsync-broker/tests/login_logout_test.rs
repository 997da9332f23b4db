//! Tests for native login, logout and the session re-check endpoint

mod common;

use common::{create_test_server, login, seed_identity, COMMUNITY_URL, SESSION_COOKIE};
use flixsync_core::SiteId;
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_sets_session_and_returns_sync_url() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let response = server
        .post("/auth/login")
        .json(&json!({
            "email": "jane@example.com",
            "pass": "password1",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["userid"], "u-42");

    // The response carries the iframe URL for the client-side notifier
    let sync_url = body["syncUrl"].as_str().expect("No sync URL");
    assert!(sync_url.starts_with(COMMUNITY_URL));

    assert!(response.maybe_cookie(SESSION_COOKIE).is_some());
}

#[tokio::test]
async fn test_login_wrong_password_rejected() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let response = server
        .post("/auth/login")
        .json(&json!({
            "email": "jane@example.com",
            "pass": "wrong",
        }))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_login_unknown_email_rejected() {
    let (server, _, _) = create_test_server(SiteId::Rockflix);

    let response = server
        .post("/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "pass": "password1",
        }))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_check_reflects_session_state() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    // Unauthenticated
    let response = server.get("/auth/check").await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["authenticated"], false);

    // Authenticated
    let session = login(&server, "jane@example.com", "password1").await;
    let response = server
        .get("/auth/check")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["userId"], "u-42");
    assert_eq!(body["email"], "jane@example.com");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let session = login(&server, "jane@example.com", "password1").await;

    let response = server
        .post("/auth/logout")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session.clone()))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    // Old cookie no longer authenticates
    let response = server
        .get("/auth/check")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_can_relogin_after_logout() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let session = login(&server, "jane@example.com", "password1").await;
    server
        .post("/auth/logout")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session.clone()))
        .await;

    let new_session = login(&server, "jane@example.com", "password1").await;
    assert_ne!(session, new_session);

    let response = server
        .get("/auth/check")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, new_session))
        .await;
    assert_eq!(response.status_code(), 200);
}
