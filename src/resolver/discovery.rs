//! Feed source discovery for story and section pages.

use crate::app::{ResolveError, Result};
use crate::config::slug_variants;
use crate::parser::{ParsedFeed, ShowIndex};
use crate::resolver::Resolver;

/// Places a feed may come from, tried in field order.
#[derive(Debug, Default)]
pub(crate) struct FeedHints<'a> {
    /// User-supplied feed URL. Fetch failures here are fatal.
    pub override_url: Option<&'a str>,
    /// Show slug from `--show` or a provider preset.
    pub explicit_slug: Option<&'a str>,
    /// Feeds linked from the page itself.
    pub page_feeds: &'a [String],
    /// Slugs taken from the URL path or the page's embedded metadata.
    pub derived_slugs: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct DiscoveredFeed {
    pub url: String,
    pub feed: ParsedFeed,
    /// Raw feed document, kept for the debug archive.
    pub body: Vec<u8>,
}

/// What one discovery run has tried so far.
#[derive(Debug, Default)]
struct Attempts {
    urls: Vec<String>,
    override_error: Option<ResolveError>,
    last_parse_error: Option<ResolveError>,
    unreachable: usize,
}

impl Attempts {
    fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|a| a == url)
    }

    /// The feed override's parse error if there was one, then a parse error
    /// when every source fetched but none parsed, otherwise `NoFeedFound`.
    fn into_error(self, page_url: &str) -> ResolveError {
        if let Some(e) = self.override_error {
            return e;
        }
        match self.last_parse_error {
            Some(e) if self.unreachable == 0 => e,
            _ => ResolveError::NoFeedFound {
                url: page_url.to_string(),
                attempted: self.urls,
            },
        }
    }
}

impl Resolver {
    /// First feed source that fetches and parses.
    ///
    /// An unparseable feed override is reported as such when nothing else
    /// works. So is the last `Parse` error when every source was reachable
    /// but unparseable. Otherwise the error is `NoFeedFound` listing every
    /// URL tried.
    pub(crate) async fn discover_feed_source(
        &self,
        page_url: &str,
        hints: &FeedHints<'_>,
    ) -> Result<DiscoveredFeed> {
        let mut attempted = Attempts::default();

        if let Some(url) = hints.override_url {
            match self.try_feed(url, &mut attempted).await {
                Ok(found) => return Ok(found),
                Err(e @ ResolveError::Parse { .. }) => {
                    tracing::warn!("Feed override {} is unusable: {}", url, e);
                    attempted.override_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(slug) = hints.explicit_slug {
            let url = self.config.site.feed_url_for(slug);
            if let Some(found) = self.try_optional(&url, &mut attempted).await? {
                return Ok(found);
            }
        }

        for url in hints.page_feeds {
            if let Some(found) = self.try_optional(url, &mut attempted).await? {
                return Ok(found);
            }
        }

        let mut index: Option<ShowIndex> = None;
        for slug in &hints.derived_slugs {
            if index.is_none() {
                index = Some(self.show_index().await);
            }

            let mut urls: Vec<String> = Vec::new();
            if let Some(url) = index.as_ref().and_then(|i| i.feed_url(slug)) {
                urls.push(url.to_string());
            }
            urls.extend(
                slug_variants(slug)
                    .iter()
                    .map(|variant| self.config.site.feed_url_for(variant)),
            );

            for url in &urls {
                if let Some(found) = self.try_optional(url, &mut attempted).await? {
                    return Ok(found);
                }
            }
        }

        Err(attempted.into_error(page_url))
    }

    /// Podcast index of the site; empty when it cannot be fetched.
    pub(crate) async fn show_index(&self) -> ShowIndex {
        let url = &self.config.site.podcast_index_url;
        match self.fetcher.get_text(url).await {
            Ok(html) => {
                let index = self.pages.show_index(&html);
                if index.is_empty() {
                    tracing::warn!("Podcast index at {} lists no feeds", url);
                } else {
                    tracing::debug!("Podcast index lists {} feeds", index.len());
                }
                index
            }
            Err(e) => {
                tracing::warn!("Podcast index unavailable: {}", e);
                ShowIndex::default()
            }
        }
    }

    /// Like [`Self::try_feed`], but fetch and parse failures mean "try the next one".
    async fn try_optional(
        &self,
        url: &str,
        attempted: &mut Attempts,
    ) -> Result<Option<DiscoveredFeed>> {
        if attempted.contains(url) {
            return Ok(None);
        }
        match self.try_feed(url, attempted).await {
            Ok(found) => Ok(Some(found)),
            Err(e @ ResolveError::Fetch { .. }) => {
                tracing::debug!("Skipping feed {}: {}", url, e);
                attempted.unreachable += 1;
                Ok(None)
            }
            Err(e @ ResolveError::Parse { .. }) => {
                tracing::debug!("Skipping feed {}: {}", url, e);
                attempted.last_parse_error = Some(e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_feed(&self, url: &str, attempted: &mut Attempts) -> Result<DiscoveredFeed> {
        attempted.urls.push(url.to_string());
        tracing::debug!("Trying feed {}", url);
        let body = self.fetcher.get(url).await?;
        let feed = self.feeds.parse(&body)?;
        Ok(DiscoveredFeed {
            url: url.to_string(),
            feed,
            body,
        })
    }
}
