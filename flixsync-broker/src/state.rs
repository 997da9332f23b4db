//! Broker state shared by all routes

use std::time::Duration;

use flixsync_core::{OriginAllowList, SharedSecret, SiteId, TOKEN_VALIDITY_SECS};

use crate::session::SessionIssuer;
use crate::store::{IdentityStore, ReplayCache};

/// Timeout for the fire-and-forget push to the peer origin
const PEER_HTTP_TIMEOUT_SECS: u64 = 5;

/// Broker application state, generic over the store and issuer seams
pub struct AppState<I, S, R> {
    /// Which of the two cooperating sites this broker serves
    pub site: SiteId,
    pub movies_url: String,
    pub community_url: String,
    /// Secret shared with the peer deployment
    pub secret: SharedSecret,
    /// Sync token validity window in seconds
    pub token_validity_secs: i64,
    pub identities: I,
    pub sessions: S,
    pub replay: R,
    pub http: reqwest::Client,
}

impl<I, S, R> AppState<I, S, R>
where
    I: IdentityStore,
    S: SessionIssuer,
    R: ReplayCache,
{
    pub fn new(
        site: SiteId,
        movies_url: String,
        community_url: String,
        secret: SharedSecret,
        identities: I,
        sessions: S,
        replay: R,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PEER_HTTP_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            site,
            movies_url,
            community_url,
            secret,
            token_validity_secs: TOKEN_VALIDITY_SECS,
            identities,
            sessions,
            replay,
            http,
        }
    }

    /// Base URL of the site this broker serves
    pub fn base_url(&self) -> &str {
        match self.site {
            SiteId::Rockflix => &self.movies_url,
            SiteId::Talkflix => &self.community_url,
        }
    }

    /// Base URL of the sibling site
    pub fn peer_url(&self) -> &str {
        match self.site {
            SiteId::Rockflix => &self.community_url,
            SiteId::Talkflix => &self.movies_url,
        }
    }

    /// The two-origin allow-list for incoming sync messages
    pub fn allow_list(&self) -> OriginAllowList {
        OriginAllowList::new(&self.movies_url, &self.community_url)
    }
}
