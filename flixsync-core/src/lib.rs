//! Flixsync Core Library
//!
//! Shared protocol types for cross-domain identity sync between the
//! movies site (ROCKFLIX) and the community site (TalkFlix):
//! - Short-lived signed sync tokens one origin issues and the other redeems
//! - The postMessage event and localStorage flag wire formats
//! - Site identifiers and the two-origin allow-list

pub mod error;
pub mod event;
pub mod secret;
pub mod site;
pub mod token;

pub use error::Error;
pub use event::{SyncEvent, SyncFlag, SYNC_FLAG_KEY, SYNC_MAX_AGE_MS, SYNC_MESSAGE_TYPE};
pub use secret::SharedSecret;
pub use site::{OriginAllowList, SiteId};
pub use token::{SyncToken, SyncTokenClaims, TOKEN_VALIDITY_SECS};

/// Result type for flixsync-core operations
pub type Result<T> = std::result::Result<T, Error>;
