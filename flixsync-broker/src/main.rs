//! Flixsync Broker
//!
//! Per-origin sync broker keeping a user logged in across the movies
//! site (ROCKFLIX) and the community site (TalkFlix).

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flixsync_broker::{
    load_or_generate_shared_secret, routes, AppState, Config, InMemoryIdentityStore,
    InMemoryReplayCache, InMemorySessionIssuer, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flixsync_broker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    // Load or generate the shared sync secret
    let secret = load_or_generate_shared_secret(&config.secret_file)?;

    let sessions = InMemorySessionIssuer::new(config.site);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(site = %config.site, "Sync broker listening on http://{}", addr);

    match &config.database_path {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            let state = Arc::new(AppState::new(
                config.site,
                config.movies_url.clone(),
                config.community_url.clone(),
                secret,
                store.clone(),
                sessions,
                store,
            ));
            axum::serve(listener, routes::create_router(state)).await?;
        }
        None => {
            let state = Arc::new(AppState::new(
                config.site,
                config.movies_url.clone(),
                config.community_url.clone(),
                secret,
                InMemoryIdentityStore::new(),
                sessions,
                InMemoryReplayCache::new(),
            ));
            axum::serve(listener, routes::create_router(state)).await?;
        }
    }

    Ok(())
}
