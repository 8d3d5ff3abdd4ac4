//! URL classification: story page or section page, and which show it belongs to.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::app::{ResolveError, Result};
use crate::config::SiteConfig;

static STORY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+(?:\.\d+)*$").unwrap());

static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A single story or episode page.
    Story,
    /// A show landing page or any other listing.
    Section,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: UrlKind,
    pub show_slug: Option<String>,
    /// Parsed input, fragment removed.
    pub url: Url,
}

impl Classification {
    pub fn is_story(&self) -> bool {
        self.kind == UrlKind::Story
    }
}

pub fn classify(input: &str, site: &SiteConfig) -> Result<Classification> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ResolveError::Classification("empty URL".to_string()));
    }

    let mut url = Url::parse(input)
        .map_err(|e| ResolveError::Classification(format!("invalid URL {input:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ResolveError::Classification(format!(
            "unsupported scheme {:?} in {input}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ResolveError::Classification(format!("missing host in {input}")));
    }
    url.set_fragment(None);

    let kind = if is_story_path(url.path()) {
        UrlKind::Story
    } else {
        UrlKind::Section
    };
    let show_slug = show_slug(url.path(), &site.story_prefix, kind);

    Ok(Classification {
        kind,
        show_slug,
        url,
    })
}

/// Whether the last non-empty segment of `path` carries a story id.
pub fn is_story_path(path: &str) -> bool {
    path.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .is_some_and(|segment| STORY_SEGMENT.is_match(segment))
}

/// Canonical string form used for cache keys: no fragment, no trailing slash.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().trim_end_matches('/').to_string()
}

fn show_slug(path: &str, prefix: &str, kind: UrlKind) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let slug = segments.first()?.to_ascii_lowercase();

    if kind == UrlKind::Story && segments.len() == 1 {
        return None;
    }
    SLUG.is_match(&slug).then_some(slug)
}
