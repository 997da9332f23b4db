//! Flixsync Broker
//!
//! Per-origin sync broker keeping a user logged in across the movies
//! site (ROCKFLIX) and the community site (TalkFlix). Each origin runs
//! its own broker against its own session issuer; both share a single
//! identity store.

pub mod config;
pub mod crypto;
pub mod error;
pub mod exchange;
pub mod notifier;
pub mod reconciler;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

pub use config::{load_or_generate_shared_secret, Config};
pub use error::SyncError;
pub use reconciler::{
    Disposition, FlagStore, HttpSessionRefresher, InMemoryFlagStore, Reconciler, SessionRefresher,
};
pub use session::{InMemorySessionIssuer, NativeSession, SessionId, SessionIssuer};
pub use state::AppState;
pub use store::{
    Identity, IdentityId, IdentityStore, InMemoryIdentityStore, InMemoryReplayCache,
    ProfileFields, RedeemedToken, ReplayCache, SqliteStore,
};
