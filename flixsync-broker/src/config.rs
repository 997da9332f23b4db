//! Broker configuration

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use flixsync_core::{SharedSecret, SiteId};

#[derive(Debug, Clone)]
pub struct Config {
    /// Which site this broker serves
    pub site: SiteId,

    /// Port to listen on
    pub port: u16,

    /// Base URL of the movies site
    pub movies_url: String,

    /// Base URL of the community site
    pub community_url: String,

    /// File holding the base64-encoded shared sync secret
    pub secret_file: String,

    /// SQLite database path; in-memory stores are used when unset
    pub database_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            site: std::env::var("FLIXSYNC_SITE")
                .ok()
                .and_then(|s| SiteId::from_str(&s))
                .unwrap_or(defaults.site),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            movies_url: std::env::var("MOVIES_URL").unwrap_or(defaults.movies_url),
            community_url: std::env::var("COMMUNITY_URL").unwrap_or(defaults.community_url),
            secret_file: std::env::var("SYNC_SECRET_FILE").unwrap_or(defaults.secret_file),
            database_path: std::env::var("DATABASE_PATH").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteId::Rockflix,
            port: 3000,
            movies_url: "https://rockflix.tv".to_string(),
            community_url: "https://talkflix.org".to_string(),
            secret_file: "sync_secret.b64".to_string(),
            database_path: None,
        }
    }
}

/// Load the shared secret from a file, generating and persisting a new
/// one when the file does not exist
pub fn load_or_generate_shared_secret(path: &str) -> Result<SharedSecret> {
    if Path::new(path).exists() {
        let encoded = fs::read_to_string(path)
            .with_context(|| format!("Failed to read secret file {}", path))?;
        let secret = SharedSecret::from_base64(encoded.trim())
            .with_context(|| format!("Invalid secret in {}", path))?;
        Ok(secret)
    } else {
        let secret = SharedSecret::generate();
        fs::write(path, secret.to_base64())
            .with_context(|| format!("Failed to write secret file {}", path))?;
        tracing::warn!(
            path,
            "Generated a new shared sync secret; copy it to the peer deployment"
        );
        Ok(secret)
    }
}
