use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::{ResolveError, Result};
use crate::classifier::is_story_path;
use crate::config::SiteConfig;
use crate::domain::{ShowLink, StoryLink};
use crate::parser::embedded;

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(ANCHORS, "a[href]");
selector!(ALTERNATE_LINKS, r#"link[rel~="alternate"][href]"#);
selector!(OG_TITLE, r#"meta[property="og:title"]"#);
selector!(OG_DESCRIPTION, r#"meta[property="og:description"]"#);
selector!(OG_IMAGE, r#"meta[property="og:image"]"#);
selector!(TITLE, "title");
selector!(H1, "h1");

/// What a story page tells us about its episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryPage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Show slug named by the page's embedded audio block.
    pub show_slug: Option<String>,
    /// Feed URLs linked from the page, in document order.
    pub feed_urls: Vec<String>,
}

/// Show slug to feed URL, in the order the index page lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowIndex {
    entries: Vec<(String, String)>,
}

impl ShowIndex {
    pub fn feed_url(&self, slug: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(slug))
            .map(|(_, url)| url.as_str())
    }

    pub fn shows(&self) -> Vec<ShowLink> {
        self.entries
            .iter()
            .map(|(slug, _)| ShowLink {
                title: slug.clone(),
                slug: slug.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// HTML extraction for story, section and podcast index pages.
#[derive(Debug, Clone)]
pub struct PageParser {
    site: SiteConfig,
    base: Url,
    feed_pattern: Regex,
    show_mention: Regex,
}

impl PageParser {
    pub fn new(site: SiteConfig) -> Result<Self> {
        let base = Url::parse(&site.base_url)
            .map_err(|e| ResolveError::Config(format!("invalid site base_url {:?}: {e}", site.base_url)))?;
        let feed_pattern = Regex::new(&format!(
            r#"(?i)(?:https?://[a-z0-9.-]+)?{}([a-z0-9_-]+)\.xml"#,
            regex::escape(&site.feed_prefix)
        ))
        .map_err(|e| ResolveError::Config(format!("invalid feed_prefix: {e}")))?;
        let show_mention = Regex::new(&format!(
            r"(?i){}([a-z0-9-]+)/",
            regex::escape(&site.story_prefix)
        ))
        .map_err(|e| ResolveError::Config(format!("invalid story_prefix: {e}")))?;

        Ok(Self {
            site,
            base,
            feed_pattern,
            show_mention,
        })
    }

    /// Episode metadata of a story page.
    ///
    /// The embedded audio block wins; Open Graph, `<title>` and the first
    /// `<h1>` are fallbacks for the title.
    pub fn story_page(&self, html: &str, page_url: &Url) -> StoryPage {
        let audio = match embedded::extract_audio(html) {
            Ok(audio) => audio.unwrap_or_default(),
            Err(e) => {
                tracing::debug!("Ignoring embedded state on {}: {}", page_url, e);
                Default::default()
            }
        };

        let document = Html::parse_document(html);
        let title = audio
            .title
            .or_else(|| meta_content(&document, &OG_TITLE))
            .or_else(|| first_text(&document, &TITLE))
            .or_else(|| first_text(&document, &H1));
        let description = audio
            .description
            .or_else(|| meta_content(&document, &OG_DESCRIPTION));
        let image_url = audio.image_url.or_else(|| {
            meta_content(&document, &OG_IMAGE)
                .and_then(|src| page_url.join(&src).ok())
                .map(String::from)
        });

        StoryPage {
            title,
            description,
            image_url,
            published_at: audio.published_at,
            show_slug: audio.show_slug.map(|s| s.to_ascii_lowercase()),
            feed_urls: self.feed_links_in(&document, html, page_url),
        }
    }

    /// Feed URLs a page links to: `<link rel="alternate">` feeds first,
    /// then canonical feed URLs mentioned anywhere in the markup.
    pub fn feed_links(&self, html: &str, page_url: &Url) -> Vec<String> {
        let document = Html::parse_document(html);
        self.feed_links_in(&document, html, page_url)
    }

    fn feed_links_in(&self, document: &Html, html: &str, page_url: &Url) -> Vec<String> {
        let mut found = Vec::new();
        let mut push = |href: &str| {
            if let Ok(url) = page_url.join(href.trim()) {
                let url = url.to_string();
                if !found.contains(&url) {
                    found.push(url);
                }
            }
        };

        for link in document.select(&ALTERNATE_LINKS) {
            let kind = link.value().attr("type").unwrap_or_default().to_ascii_lowercase();
            if kind.contains("rss+xml") || kind.contains("atom+xml") {
                if let Some(href) = link.value().attr("href") {
                    push(href);
                }
            }
        }
        for m in self.feed_pattern.find_iter(html) {
            push(m.as_str());
        }

        found
    }

    /// Story pages linked from a section page.
    pub fn story_links(&self, html: &str, page_url: &Url) -> Vec<StoryLink> {
        let document = Html::parse_document(html);
        let mut links: Vec<StoryLink> = Vec::new();

        for anchor in document.select(&ANCHORS) {
            let Some(mut url) = anchor
                .value()
                .attr("href")
                .and_then(|href| page_url.join(href.trim()).ok())
            else {
                continue;
            };
            if !self.is_site_url(&url)
                || !url.path().starts_with(&self.site.story_prefix)
                || !is_story_path(url.path())
            {
                continue;
            }
            url.set_query(None);
            url.set_fragment(None);
            let url = url.to_string();
            if links.iter().any(|l| l.url == url) {
                continue;
            }

            let text = collapse_text(anchor);
            links.push(StoryLink {
                title: if text.is_empty() { url.clone() } else { text },
                url,
            });
        }

        links
    }

    /// Shows linked from a page. When no anchor points at a show, bare
    /// `<prefix><slug>/` mentions in the markup are used instead.
    pub fn show_links(&self, html: &str, page_url: &Url) -> Vec<ShowLink> {
        let document = Html::parse_document(html);
        let mut shows: Vec<ShowLink> = Vec::new();

        for anchor in document.select(&ANCHORS) {
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| page_url.join(href.trim()).ok())
            else {
                continue;
            };
            if !self.is_site_url(&url) {
                continue;
            }
            let Some(slug) = self.show_slug_of(url.path()) else {
                continue;
            };
            if shows.iter().any(|s| s.slug == slug) {
                continue;
            }
            let text = collapse_text(anchor);
            shows.push(ShowLink {
                title: if text.is_empty() { slug.clone() } else { text },
                slug,
            });
        }

        if shows.is_empty() {
            for caps in self.show_mention.captures_iter(html) {
                let slug = caps[1].to_ascii_lowercase();
                if self.site.is_reserved_slug(&slug) || shows.iter().any(|s| s.slug == slug) {
                    continue;
                }
                shows.push(ShowLink {
                    title: slug.clone(),
                    slug,
                });
            }
        }

        shows
    }

    /// Slug to feed URL entries of the podcast index page.
    pub fn show_index(&self, html: &str) -> ShowIndex {
        let mut entries: Vec<(String, String)> = Vec::new();
        for caps in self.feed_pattern.captures_iter(html) {
            let slug = caps[1].to_string();
            if entries.iter().any(|(s, _)| *s == slug) {
                continue;
            }
            let Ok(url) = self.base.join(&caps[0]) else {
                continue;
            };
            entries.push((slug, url.to_string()));
        }
        ShowIndex { entries }
    }

    fn is_site_url(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https") && url.host_str() == self.base.host_str()
    }

    fn show_slug_of(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(&self.site.story_prefix)?;
        let slug = rest.strip_suffix('/').unwrap_or(rest);
        if slug.is_empty()
            || slug.contains('/')
            || !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            || is_story_path(slug)
        {
            return None;
        }
        let slug = slug.to_ascii_lowercase();
        (!self.site.is_reserved_slug(&slug)).then_some(slug)
    }
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(collapse_text)
        .find(|text| !text.is_empty())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}
