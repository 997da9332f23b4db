//! Sync event and same-tab flag wire types
//!
//! A sync event is untrusted input: it asserts that a user authenticated
//! on the other origin, but proves nothing. Receivers may only use it to
//! trigger their own authoritative session re-check.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::SiteId;

/// The postMessage payload type tag
pub const SYNC_MESSAGE_TYPE: &str = "CROSS_DOMAIN_AUTH_SYNC";

/// Events and flags older than this are discarded, in milliseconds
pub const SYNC_MAX_AGE_MS: i64 = 60_000;

/// localStorage key for the same-tab delivery fallback
pub const SYNC_FLAG_KEY: &str = "auth_sync_needed";

/// Cross-origin sync notification, delivered via postMessage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    #[serde(rename = "type")]
    pub kind: String,

    pub user_id: String,

    pub email: String,

    /// Site the user authenticated on
    pub from: SiteId,

    /// Site that should refresh its session
    pub target: SiteId,

    /// Milliseconds since the epoch, set by the sending page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SyncEvent {
    pub fn new(user_id: &str, email: &str, from: SiteId, target: SiteId) -> Self {
        Self {
            kind: SYNC_MESSAGE_TYPE.to_string(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            from,
            target,
            timestamp: Some(Utc::now().timestamp_millis()),
        }
    }

    pub fn is_sync_message(&self) -> bool {
        self.kind == SYNC_MESSAGE_TYPE
    }

    /// Events without a timestamp are treated as fresh; the staleness
    /// check exists for replayed flags, not for clock enforcement
    pub fn is_stale(&self, now_ms: i64) -> bool {
        match self.timestamp {
            Some(ts) => now_ms - ts > SYNC_MAX_AGE_MS,
            None => false,
        }
    }
}

/// Same-tab fallback flag written to localStorage by the sync page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFlag {
    pub user_id: String,
    pub email: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
}

impl SyncFlag {
    pub fn new(user_id: &str, email: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp > SYNC_MAX_AGE_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let event = SyncEvent::new("u-42", "jane@example.com", SiteId::Rockflix, SiteId::Talkflix);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], SYNC_MESSAGE_TYPE);
        assert_eq!(value["userId"], "u-42");
        assert_eq!(value["email"], "jane@example.com");
        assert_eq!(value["from"], "rockflix");
        assert_eq!(value["target"], "talkflix");
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_event_parses_without_timestamp() {
        let value = json!({
            "type": SYNC_MESSAGE_TYPE,
            "userId": "u-42",
            "email": "jane@example.com",
            "from": "rockflix",
            "target": "talkflix",
        });
        let event: SyncEvent = serde_json::from_value(value).unwrap();
        assert!(event.is_sync_message());
        assert!(!event.is_stale(Utc::now().timestamp_millis()));
    }

    #[test]
    fn test_event_staleness() {
        let mut event =
            SyncEvent::new("u-42", "jane@example.com", SiteId::Rockflix, SiteId::Talkflix);
        let now = Utc::now().timestamp_millis();

        assert!(!event.is_stale(now));

        event.timestamp = Some(now - SYNC_MAX_AGE_MS - 1);
        assert!(event.is_stale(now));
    }

    #[test]
    fn test_flag_staleness() {
        let mut flag = SyncFlag::new("u-42", "jane@example.com");
        let now = Utc::now().timestamp_millis();

        assert!(!flag.is_stale(now));

        flag.timestamp = now - SYNC_MAX_AGE_MS - 1;
        assert!(flag.is_stale(now));
    }
}
