//! Site profile: where stories, shows and feeds live on the content platform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host used to absolutize relative links.
    pub base_url: String,
    /// Path prefix under which show and story pages live. The segment right
    /// after it is the show slug.
    pub story_prefix: String,
    /// Path prefix of canonical podcast feeds; `<prefix><slug>.xml`.
    pub feed_prefix: String,
    /// Page listing every podcast feed of the site.
    pub podcast_index_url: String,
    /// Slugs under `story_prefix` that never name a show.
    pub reserved_slugs: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.cbc.ca".to_string(),
            story_prefix: "/radio/".to_string(),
            feed_prefix: "/podcasting/includes/".to_string(),
            podcast_index_url: "https://www.cbc.ca/podcasting/".to_string(),
            reserved_slugs: vec![
                "radio".to_string(),
                "podcastnews".to_string(),
                "podcasts".to_string(),
                "listen".to_string(),
            ],
        }
    }
}

impl SiteConfig {
    /// Canonical feed URL for a show slug.
    pub fn feed_url_for(&self, slug: &str) -> String {
        format!(
            "{}{}{}.xml",
            self.base_url.trim_end_matches('/'),
            self.feed_prefix,
            slug
        )
    }

    pub fn is_reserved_slug(&self, slug: &str) -> bool {
        self.reserved_slugs.iter().any(|s| s.eq_ignore_ascii_case(slug))
    }
}

/// Built-in provider presets: short show name -> show slug.
pub fn default_providers() -> BTreeMap<String, String> {
    [
        ("ideas", "ideas"),
        ("thecurrent", "thecurrent"),
        ("q", "q"),
        ("asithappens", "asithappens"),
        ("day6", "day6"),
    ]
    .into_iter()
    .map(|(name, slug)| (name.to_string(), slug.to_string()))
    .collect()
}

/// Spellings a show slug may have in the feed namespace, most likely first.
pub fn slug_variants(slug: &str) -> Vec<String> {
    if slug.contains('/') {
        return vec![slug.to_string()];
    }

    let mut variants = vec![slug.to_string()];
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    };

    if slug.contains('-') {
        push(slug.replace('-', ""));
    }
    if let Some(rest) = slug.strip_prefix("the-") {
        push(rest.to_string());
    }
    if let Some(rest) = slug.strip_prefix("the") {
        push(rest.trim_start_matches('-').to_string());
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_for() {
        let site = SiteConfig::default();
        assert_eq!(
            site.feed_url_for("ideas"),
            "https://www.cbc.ca/podcasting/includes/ideas.xml"
        );
    }

    #[test]
    fn test_slug_variants() {
        assert_eq!(slug_variants("ideas"), vec!["ideas"]);
        assert_eq!(
            slug_variants("the-current"),
            vec!["the-current", "thecurrent", "current"]
        );
        assert_eq!(slug_variants("thecurrent"), vec!["thecurrent", "current"]);
        assert_eq!(slug_variants("a/b"), vec!["a/b"]);
    }

    #[test]
    fn test_reserved_slug() {
        let site = SiteConfig::default();
        assert!(site.is_reserved_slug("podcasts"));
        assert!(!site.is_reserved_slug("ideas"));
    }
}
