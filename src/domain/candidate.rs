use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matcher::part_number;

/// A feed item or story link that might be the episode the user is after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub enclosure_url: Option<String>,
    pub part_number: Option<u32>,
    pub source_ordinal: usize,
    pub link: Option<String>,
    pub description: Option<String>,
}

impl EpisodeCandidate {
    pub fn new(title: impl Into<String>, source_ordinal: usize) -> Self {
        let title = title.into();
        let part_number = part_number(&title);
        Self {
            title,
            published_at: None,
            enclosure_url: None,
            part_number,
            source_ordinal,
            link: None,
            description: None,
        }
    }

    pub fn with_enclosure(mut self, url: impl Into<String>) -> Self {
        self.enclosure_url = Some(url.into());
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Only candidates carrying an enclosure can be a final resolution.
    pub fn is_resolvable(&self) -> bool {
        self.enclosure_url.is_some()
    }
}

/// Owned form of a scored candidate, used once a ranking leaves the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub score: f64,
    pub reasons: Vec<String>,
    pub candidate: EpisodeCandidate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_extracts_part_number() {
        let candidate = EpisodeCandidate::new("Injustice For All, Part 2", 0);
        assert_eq!(candidate.part_number, Some(2));
        assert!(!candidate.is_resolvable());
    }

    #[test]
    fn test_with_enclosure_is_resolvable() {
        let candidate = EpisodeCandidate::new("Episode", 3).with_enclosure("https://example.com/a.mp3");
        assert!(candidate.is_resolvable());
        assert_eq!(candidate.source_ordinal, 3);
    }

    #[test]
    fn test_display_title_without_title() {
        let candidate = EpisodeCandidate::new("", 0);
        assert_eq!(candidate.display_title(), "(Untitled)");
    }
}
