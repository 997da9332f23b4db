//! Broker error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Message shown for every token-exchange failure; the variants are
/// distinguished in the logs only
const SYNC_FAILED: &str = "Sync failed, please log in manually";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Missing parameters")]
    MissingParams,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Password too short (minimum 6 characters)")]
    PasswordTooShort,

    #[error("Sync token expired")]
    ExpiredToken,

    #[error("Sync token signature invalid")]
    InvalidSignature,

    #[error("Sync token already redeemed")]
    AlreadyRedeemed,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<flixsync_core::Error> for SyncError {
    fn from(err: flixsync_core::Error) -> Self {
        use flixsync_core::Error as CoreError;
        match err {
            CoreError::ExpiredToken => SyncError::ExpiredToken,
            CoreError::InvalidSignature | CoreError::InvalidToken(_) => SyncError::InvalidSignature,
            other => SyncError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SyncError::IdentityNotFound => (StatusCode::NOT_FOUND, "User not found"),
            SyncError::MissingParams => (StatusCode::BAD_REQUEST, "Missing userId or email"),
            SyncError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            SyncError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            SyncError::UsernameTaken => (StatusCode::BAD_REQUEST, "Username is already taken"),
            SyncError::PasswordTooShort => {
                (StatusCode::BAD_REQUEST, "Password must be at least 6 characters")
            }
            SyncError::ExpiredToken => {
                tracing::warn!("Sync token expired");
                (StatusCode::UNAUTHORIZED, SYNC_FAILED)
            }
            SyncError::InvalidSignature => {
                tracing::warn!("Sync token signature invalid");
                (StatusCode::UNAUTHORIZED, SYNC_FAILED)
            }
            SyncError::AlreadyRedeemed => {
                tracing::warn!("Sync token already redeemed");
                (StatusCode::UNAUTHORIZED, SYNC_FAILED)
            }
            SyncError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            SyncError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
