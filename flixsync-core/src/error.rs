//! Error types for flixsync-core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Sync token expired")]
    ExpiredToken,

    #[error("Sync token signature invalid")]
    InvalidSignature,

    #[error("Invalid sync token: {0}")]
    InvalidToken(String),

    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}
