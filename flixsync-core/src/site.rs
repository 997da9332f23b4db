//! Site identifiers for the two cooperating origins

use serde::{Deserialize, Serialize};

/// The two cooperating deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteId {
    /// The movies site (ROCKFLIX)
    Rockflix,
    /// The community site (TalkFlix)
    Talkflix,
}

impl SiteId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteId::Rockflix => "rockflix",
            SiteId::Talkflix => "talkflix",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rockflix" => Some(SiteId::Rockflix),
            "talkflix" => Some(SiteId::Talkflix),
            _ => None,
        }
    }

    /// The sibling deployment
    pub fn peer(&self) -> SiteId {
        match self {
            SiteId::Rockflix => SiteId::Talkflix,
            SiteId::Talkflix => SiteId::Rockflix,
        }
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Allow-list of origins trusted to send sync messages
///
/// Messages from any other origin must be dropped unconditionally,
/// regardless of payload shape.
#[derive(Debug, Clone)]
pub struct OriginAllowList {
    origins: [String; 2],
}

impl OriginAllowList {
    pub fn new(movies_origin: &str, community_origin: &str) -> Self {
        Self {
            origins: [normalize(movies_origin), normalize(community_origin)],
        }
    }

    /// Check whether an origin (as reported by the message event) is one
    /// of the two cooperating deployments
    pub fn allows(&self, origin: &str) -> bool {
        let origin = normalize(origin);
        self.origins.iter().any(|o| *o == origin)
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_roundtrip() {
        assert_eq!(SiteId::from_str("rockflix"), Some(SiteId::Rockflix));
        assert_eq!(SiteId::from_str("TALKFLIX"), Some(SiteId::Talkflix));
        assert_eq!(SiteId::from_str("example"), None);
        assert_eq!(SiteId::Rockflix.as_str(), "rockflix");
    }

    #[test]
    fn test_peer() {
        assert_eq!(SiteId::Rockflix.peer(), SiteId::Talkflix);
        assert_eq!(SiteId::Talkflix.peer(), SiteId::Rockflix);
    }

    #[test]
    fn test_site_serde_uses_lowercase() {
        let json = serde_json::to_string(&SiteId::Rockflix).unwrap();
        assert_eq!(json, r#""rockflix""#);
        let site: SiteId = serde_json::from_str(r#""talkflix""#).unwrap();
        assert_eq!(site, SiteId::Talkflix);
    }

    #[test]
    fn test_allow_list_accepts_both_origins() {
        let list = OriginAllowList::new("https://rockflix.tv", "https://talkflix.org");
        assert!(list.allows("https://rockflix.tv"));
        assert!(list.allows("https://talkflix.org"));
        assert!(list.allows("https://rockflix.tv/"));
        assert!(list.allows("HTTPS://ROCKFLIX.TV"));
    }

    #[test]
    fn test_allow_list_rejects_other_origins() {
        let list = OriginAllowList::new("https://rockflix.tv", "https://talkflix.org");
        assert!(!list.allows("https://evil.example"));
        assert!(!list.allows("https://rockflix.tv.evil.example"));
        assert!(!list.allows(""));
    }
}
