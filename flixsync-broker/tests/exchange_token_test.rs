//! Tests for sync token redemption over HTTP

mod common;

use common::{create_test_server, seed_identity, SESSION_COOKIE};
use flixsync_core::{SharedSecret, SiteId, SyncToken, TOKEN_VALIDITY_SECS};
use serde_json::{json, Value};

const SYNC_FAILED: &str = "Sync failed, please log in manually";

/// Obtain a sync token from the movies-side sync-from endpoint
async fn obtain_token(server: &axum_test::TestServer) -> String {
    let response = server
        .post("/auth/sync-from-talkflix")
        .json(&json!({
            "userId": "u-42",
            "email": "jane@example.com",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    body["syncToken"].as_str().expect("No sync token").to_string()
}

#[tokio::test]
async fn test_exchange_mints_local_session() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let token = obtain_token(&server).await;

    let response = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["userId"], "u-42");

    let session = response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string();

    // The minted session passes the authoritative re-check
    let response = server
        .get("/auth/check")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["userId"], "u-42");
}

#[tokio::test]
async fn test_exchange_accepts_token_in_query() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let token = obtain_token(&server).await;

    let response = server
        .post("/auth/exchange-sync-token")
        .add_query_param("token", token)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_retried_exchange_is_idempotent() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let token = obtain_token(&server).await;

    let first = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token }))
        .await;
    assert_eq!(first.status_code(), 200);
    let first_session = first
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string();

    // A retry gets the same session back, not a second one
    let second = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token }))
        .await;
    assert_eq!(second.status_code(), 200);
    let second_session = second
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string();

    assert_eq!(first_session, second_session);
}

#[tokio::test]
async fn test_replay_after_logout_rejected() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let token = obtain_token(&server).await;

    let response = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token }))
        .await;
    let session = response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string();

    server
        .post("/auth/logout")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;

    // The token was consumed and its session is gone
    let response = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token }))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["reason"], SYNC_FAILED);
}

#[tokio::test]
async fn test_expired_token_rejected_uniformly() {
    let (server, identities, secret) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    let token = SyncToken::create(
        "u-42",
        "jane@example.com",
        None,
        SiteId::Talkflix,
        chrono::Duration::seconds(-300),
        &secret,
    )
    .unwrap();

    let response = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token.encoded() }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["reason"], SYNC_FAILED);
}

#[tokio::test]
async fn test_foreign_secret_rejected() {
    let (server, identities, _) = create_test_server(SiteId::Rockflix);
    seed_identity(&identities, "u-42", "jane@example.com", "jane", "password1");

    // Signed with a secret the cooperating origins never shared
    let token = SyncToken::create(
        "u-42",
        "jane@example.com",
        None,
        SiteId::Talkflix,
        chrono::Duration::seconds(TOKEN_VALIDITY_SECS),
        &SharedSecret::generate(),
    )
    .unwrap();

    let response = server
        .post("/auth/exchange-sync-token")
        .json(&json!({ "token": token.encoded() }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["reason"], SYNC_FAILED);
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let (server, _, _) = create_test_server(SiteId::Rockflix);

    let response = server
        .post("/auth/exchange-sync-token")
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), 400);
}
