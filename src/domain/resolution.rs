use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::RankedCandidate;

/// Identity of one resolution request, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub url: String,
    pub show: Option<String>,
    pub title: Option<String>,
}

impl ResolutionKey {
    pub fn new(url: impl Into<String>, show: Option<&str>, title: Option<&str>) -> Self {
        let clean = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Self {
            url: url.into(),
            show: show.and_then(clean),
            title: title.and_then(clean),
        }
    }

    /// Deterministic hex digest of the key components
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.show.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(self.title.as_deref().unwrap_or("").as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResult {
    pub enclosure_url: String,
    pub matched_title: String,
    pub resolved_at: DateTime<Utc>,
    pub candidates_considered: usize,
    pub feed_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Channel title of the feed the enclosure came from.
    pub feed_title: Option<String>,
    pub description: Option<String>,
    /// Episode artwork from the story page, else the feed's image.
    pub image_url: Option<String>,
}

/// Successful outcome of a resolve call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        result: ResolvedResult,
        from_cache: bool,
    },
    Ranked(Vec<RankedCandidate>),
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ResolvedResult> {
        match self {
            Resolution::Resolved { result, .. } => Some(result),
            Resolution::Ranked(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let a = ResolutionKey::new("https://www.cbc.ca/radio/ideas/x-1.2", Some("ideas"), None);
        let b = ResolutionKey::new("https://www.cbc.ca/radio/ideas/x-1.2", Some("ideas"), None);
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_digest_separates_components() {
        let a = ResolutionKey::new("u", Some("ab"), Some("c"));
        let b = ResolutionKey::new("u", Some("a"), Some("bc"));
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_blank_overrides_are_dropped() {
        let a = ResolutionKey::new("u", Some("  "), Some(""));
        let b = ResolutionKey::new("u", None, None);
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }
}
