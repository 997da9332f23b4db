//! Sync reconciler
//!
//! Long-lived listener in each origin's client runtime. It receives sync
//! events, validates the sender origin against the two-origin
//! allow-list, and triggers a re-check of this origin's own
//! authoritative session state. The event payload is untrusted input: it
//! can only trigger a re-check, never assert a login, and failures are
//! never surfaced to the user.

use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;

use flixsync_core::{OriginAllowList, SiteId, SyncEvent, SyncFlag};

/// Seam to this origin's authoritative session re-check
pub trait SessionRefresher: Send + Sync {
    fn refresh(&self) -> Result<(), String>;
}

/// Same-tab flag storage (localStorage in the browser runtime)
pub trait FlagStore: Send + Sync {
    fn read(&self) -> Option<SyncFlag>;
    fn write(&self, flag: &SyncFlag);
    fn clear(&self);
}

/// In-memory flag store
#[derive(Default)]
pub struct InMemoryFlagStore {
    flag: RwLock<Option<SyncFlag>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for InMemoryFlagStore {
    fn read(&self) -> Option<SyncFlag> {
        self.flag.read().unwrap().clone()
    }

    fn write(&self, flag: &SyncFlag) {
        *self.flag.write().unwrap() = Some(flag.clone());
    }

    fn clear(&self) {
        *self.flag.write().unwrap() = None;
    }
}

/// What the reconciler did with an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Origin not in the allow-list; dropped unconditionally
    UntrustedOrigin,
    /// Not a sync message, or malformed
    Ignored,
    /// Sync message addressed to the other site
    NotForThisSite,
    /// Event or flag older than the staleness window
    Stale,
    /// A session re-check was triggered
    Refreshed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerPhase {
    Idle,
    Reconciling,
}

/// Per-page sync listener; no terminal state
pub struct Reconciler<R, F> {
    site: SiteId,
    allow_list: OriginAllowList,
    refresher: R,
    flags: F,
    phase: ReconcilerPhase,
}

impl<R: SessionRefresher, F: FlagStore> Reconciler<R, F> {
    pub fn new(site: SiteId, allow_list: OriginAllowList, refresher: R, flags: F) -> Self {
        Self {
            site,
            allow_list,
            refresher,
            flags,
            phase: ReconcilerPhase::Idle,
        }
    }

    pub fn phase(&self) -> ReconcilerPhase {
        self.phase
    }

    /// Handle a postMessage-style event from the given origin
    pub fn handle_message(&mut self, origin: &str, payload: &Value) -> Disposition {
        if !self.allow_list.allows(origin) {
            tracing::warn!(origin, "Dropping sync message from untrusted origin");
            return Disposition::UntrustedOrigin;
        }

        let event: SyncEvent = match serde_json::from_value(payload.clone()) {
            Ok(event) => event,
            Err(_) => return Disposition::Ignored,
        };

        if !event.is_sync_message() {
            return Disposition::Ignored;
        }
        if event.target != self.site {
            return Disposition::NotForThisSite;
        }
        if event.is_stale(Utc::now().timestamp_millis()) {
            tracing::debug!(user_id = %event.user_id, "Ignoring stale sync event");
            return Disposition::Stale;
        }

        tracing::debug!(user_id = %event.user_id, from = %event.from, "Received sync event");
        self.reconcile()
    }

    /// On mount: consume the same-tab flag a sync page load may have
    /// written before this listener existed
    pub fn check_startup_flag(&mut self) -> Disposition {
        let Some(flag) = self.flags.read() else {
            return Disposition::Ignored;
        };

        // The flag is single-use either way
        self.flags.clear();

        if flag.is_stale(Utc::now().timestamp_millis()) {
            tracing::debug!("Deleting stale sync flag");
            return Disposition::Stale;
        }

        tracing::debug!(user_id = %flag.user_id, "Found fresh sync flag");
        self.reconcile()
    }

    fn reconcile(&mut self) -> Disposition {
        self.phase = ReconcilerPhase::Reconciling;
        if let Err(err) = self.refresher.refresh() {
            // Worst case is "not yet synced"; the user can log in manually
            tracing::debug!(error = %err, "Session re-check failed");
        }
        self.phase = ReconcilerPhase::Idle;
        Disposition::Refreshed
    }
}

/// Re-check via this origin's own /auth/check endpoint
pub struct HttpSessionRefresher {
    client: reqwest::blocking::Client,
    check_url: String,
}

impl HttpSessionRefresher {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            check_url: format!("{}/auth/check", base_url.trim_end_matches('/')),
        }
    }

    pub fn check_url(&self) -> &str {
        &self.check_url
    }
}

impl SessionRefresher for HttpSessionRefresher {
    fn refresh(&self) -> Result<(), String> {
        // Any HTTP status is a completed re-check; 401 just means the
        // user still has to log in here
        self.client
            .get(&self.check_url)
            .send()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
