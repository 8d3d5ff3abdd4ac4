use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{ResolveError, Result};
use crate::domain::EpisodeCandidate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub meta: FeedMeta,
    pub candidates: Vec<EpisodeCandidate>,
}

/// Turns RSS/Atom/JSON feeds into episode candidates.
#[derive(Clone, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a feed document.
    ///
    /// Entries without an enclosure are kept only when they link somewhere;
    /// a feed without a single enclosure is rejected.
    pub fn parse(&self, body: &[u8]) -> Result<ParsedFeed> {
        let feed = parser::parse(body).map_err(|e| {
            ResolveError::parse(format!("invalid feed: {e}"), &String::from_utf8_lossy(body))
        })?;

        let meta = FeedMeta {
            title: feed
                .title
                .map(|t| decode_html_entities(t.content.trim()).to_string())
                .filter(|t| !t.is_empty()),
            image_url: feed
                .logo
                .or(feed.icon)
                .map(|image| image.uri),
        };

        let candidates: Vec<EpisodeCandidate> = feed
            .entries
            .into_iter()
            .filter_map(entry_fields)
            .enumerate()
            .map(|(ordinal, fields)| {
                let mut candidate = EpisodeCandidate::new(fields.title, ordinal);
                candidate.enclosure_url = fields.enclosure;
                candidate.link = fields.link;
                candidate.description = fields.description;
                candidate.published_at = fields.published_at;
                candidate
            })
            .collect();

        if !candidates.iter().any(EpisodeCandidate::is_resolvable) {
            return Err(ResolveError::parse(
                "no feed items with enclosures found",
                &String::from_utf8_lossy(body),
            ));
        }

        tracing::debug!("Parsed {} feed candidates", candidates.len());
        Ok(ParsedFeed { meta, candidates })
    }
}

struct EntryFields {
    title: String,
    enclosure: Option<String>,
    link: Option<String>,
    description: Option<String>,
    published_at: Option<chrono::DateTime<Utc>>,
}

fn entry_fields(entry: Entry) -> Option<EntryFields> {
    let enclosure = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
        .or_else(|| {
            entry
                .links
                .iter()
                .find(|l| l.rel.as_deref() == Some("enclosure"))
                .map(|l| l.href.clone())
        });

    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() != Some("enclosure"))
        .map(|l| l.href.clone());

    if enclosure.is_none() && link.is_none() {
        return None;
    }

    Some(EntryFields {
        title: entry
            .title
            .map(|t| decode_html_entities(t.content.trim()).to_string())
            .unwrap_or_default(),
        enclosure,
        link,
        description: entry
            .summary
            .map(|s| decode_html_entities(s.content.trim()).to_string()),
        published_at: entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc)),
    })
}
