//! Resolution pipeline: classify, consult the cache, discover a feed, match,
//! select, and remember the result.

pub mod archive;
pub mod chooser;
mod discovery;
pub mod selection;

pub use archive::DebugArchive;
pub use chooser::{Chooser, DeclineChooser};
pub use selection::{select, Selection, SelectionMode};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::app::{ResolveError, Result};
use crate::classifier::{classify, normalize_url, Classification, UrlKind};
use crate::clock::Clock;
use crate::config::Config;
use crate::domain::{
    merge_shows, EpisodeCandidate, RankedCandidate, Resolution, ResolutionKey, ResolvedResult,
    ShowLink, StoryLink,
};
use crate::fetcher::{Fetcher, RetryPolicy, RetryingFetcher};
use crate::matcher::{to_ranked, Matcher, Target};
use crate::parser::{FeedParser, PageParser, StoryPage};
use crate::store::Cache;
use discovery::{DiscoveredFeed, FeedHints};

/// Per-call knobs of [`Resolver::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Feed to use instead of discovering one.
    pub rss_url: Option<String>,
    /// Show slug whose canonical feed should be used.
    pub show: Option<String>,
    /// Provider preset name; `auto` means none.
    pub provider: Option<String>,
    /// Title to match instead of the story page's own.
    pub title: Option<String>,
    pub mode: SelectionMode,
    /// Pick among a section's story links even when it has a feed.
    pub browse_stories: bool,
    /// Overrides the configured cache TTL.
    pub cache_ttl: Option<Duration>,
    /// Skip the cache lookup and re-resolve.
    pub repair: bool,
    /// Keep fetched pages, feeds and rankings in this directory.
    pub debug_dir: Option<PathBuf>,
}

enum Choice {
    Listed(Vec<RankedCandidate>),
    Chosen {
        candidate: EpisodeCandidate,
        considered: usize,
    },
}

pub struct Resolver {
    fetcher: RetryingFetcher,
    cache: Arc<dyn Cache + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    chooser: Arc<dyn Chooser + Send + Sync>,
    config: Config,
    matcher: Matcher,
    feeds: FeedParser,
    pages: PageParser,
}

impl Resolver {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        cache: Arc<dyn Cache + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        let pages = PageParser::new(config.site.clone())?;
        Ok(Self {
            fetcher: RetryingFetcher::new(fetcher, RetryPolicy::from(&config.fetch)),
            cache,
            clock,
            chooser: Arc::new(DeclineChooser),
            matcher: Matcher::new(config.matching.clone()),
            feeds: FeedParser::new(),
            pages,
            config,
        })
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser + Send + Sync>) -> Self {
        self.chooser = chooser;
        self
    }

    /// Resolves a story or section URL to an enclosure, or to a ranked list
    /// in [`SelectionMode::List`].
    pub async fn resolve(&self, url: &str, options: &ResolveOptions) -> Result<Resolution> {
        let classification = classify(url, &self.config.site)?;
        let show = self.effective_show(options)?;
        let key = ResolutionKey::new(
            normalize_url(&classification.url),
            show.as_deref(),
            options.title.as_deref(),
        );
        let ttl = options.cache_ttl.unwrap_or_else(|| self.config.cache.ttl());

        if options.repair {
            tracing::info!("Repair mode: re-resolving {}", key.url);
        } else if options.mode == SelectionMode::Automatic {
            if let Some(result) = self.cache.get(&key, ttl)? {
                tracing::info!("Cache hit for {}", key.url);
                return Ok(Resolution::Resolved {
                    result,
                    from_cache: true,
                });
            }
        }

        tracing::debug!(
            "Resolving {} as {:?} (show: {:?})",
            key.url,
            classification.kind,
            show
        );
        let resolution = match classification.kind {
            UrlKind::Story => {
                self.resolve_story(&classification, show.as_deref(), options)
                    .await?
            }
            UrlKind::Section => {
                self.resolve_section(&classification, show.as_deref(), options)
                    .await?
            }
        };

        if let Resolution::Resolved { ref result, .. } = resolution {
            self.cache.put(&key, result)?;
            tracing::info!(
                "Resolved {} to {} ({:?})",
                key.url,
                result.enclosure_url,
                result.matched_title
            );
        }

        Ok(resolution)
    }

    /// Cache key `resolve` would use for these arguments.
    pub fn cache_key(&self, url: &str, options: &ResolveOptions) -> Result<ResolutionKey> {
        let classification = classify(url, &self.config.site)?;
        let show = self.effective_show(options)?;
        Ok(ResolutionKey::new(
            normalize_url(&classification.url),
            show.as_deref(),
            options.title.as_deref(),
        ))
    }

    /// Drops the cached resolution for these arguments.
    pub fn forget(&self, url: &str, options: &ResolveOptions) -> Result<bool> {
        let key = self.cache_key(url, options)?;
        self.cache.invalidate(&key)
    }

    pub fn clear_cache(&self) -> Result<usize> {
        self.cache.purge()
    }

    /// First feed linked from the page at `url`.
    pub async fn discover_feed(&self, url: &str) -> Result<Option<String>> {
        let classification = classify(url, &self.config.site)?;
        let html = self.fetcher.get_text(classification.url.as_str()).await?;
        Ok(self
            .pages
            .feed_links(&html, &classification.url)
            .into_iter()
            .next())
    }

    /// Story pages linked from a section page.
    pub async fn list_stories(&self, url: &str, limit: usize) -> Result<Vec<StoryLink>> {
        let classification = classify(url, &self.config.site)?;
        let html = self.fetcher.get_text(classification.url.as_str()).await?;
        let mut stories = self.pages.story_links(&html, &classification.url);
        stories.truncate(limit);
        Ok(stories)
    }

    /// Shows linked from a page, followed by the podcast index shows it
    /// does not mention.
    pub async fn list_shows(&self, url: &str, limit: usize) -> Result<Vec<ShowLink>> {
        let classification = classify(url, &self.config.site)?;
        let html = self.fetcher.get_text(classification.url.as_str()).await?;
        let on_page = self.pages.show_links(&html, &classification.url);
        tracing::debug!("{} shows linked from {}", on_page.len(), classification.url);

        let mut shows = merge_shows(on_page, self.show_index().await.shows());
        shows.truncate(limit);
        Ok(shows)
    }

    async fn resolve_story(
        &self,
        classification: &Classification,
        show: Option<&str>,
        options: &ResolveOptions,
    ) -> Result<Resolution> {
        let page_url = classification.url.as_str();
        let archive = DebugArchive::new(options.debug_dir.as_deref());
        let page = match self.fetcher.get_text(page_url).await {
            Ok(html) => {
                archive.write_document("story.html", html.as_bytes())?;
                self.pages.story_page(&html, &classification.url)
            }
            Err(e @ ResolveError::Fetch { .. }) if options.rss_url.is_some() || show.is_some() => {
                tracing::warn!("Continuing without the story page: {}", e);
                StoryPage::default()
            }
            Err(e) => return Err(e),
        };

        let title = options
            .title
            .clone()
            .or_else(|| page.title.clone())
            .unwrap_or_default();
        let target = Target::new(title, page.published_at);
        tracing::debug!("Matching against {:?}", target.title);

        let mut derived_slugs: Vec<String> = Vec::new();
        for slug in [&classification.show_slug, &page.show_slug].into_iter().flatten() {
            if !derived_slugs.contains(slug) {
                derived_slugs.push(slug.clone());
            }
        }
        let hints = FeedHints {
            override_url: options.rss_url.as_deref(),
            explicit_slug: show,
            page_feeds: &page.feed_urls,
            derived_slugs,
        };
        let found = self.discover_feed_source(page_url, &hints).await?;
        tracing::info!(
            "Using feed {} ({} candidates)",
            found.url,
            found.feed.candidates.len()
        );
        archive.write_document("feed.xml", &found.body)?;

        let choice = self.rank_and_select(
            &target,
            &found.feed.candidates,
            options.mode,
            &archive,
            "scores.json",
        )?;
        match choice {
            Choice::Listed(ranked) => Ok(Resolution::Ranked(ranked)),
            Choice::Chosen {
                candidate,
                considered,
            } => self.resolved(&candidate, considered, Some(&found), Some(&page)),
        }
    }

    async fn resolve_section(
        &self,
        classification: &Classification,
        show: Option<&str>,
        options: &ResolveOptions,
    ) -> Result<Resolution> {
        let page_url = classification.url.as_str();
        let archive = DebugArchive::new(options.debug_dir.as_deref());
        let html = self.fetcher.get_text(page_url).await?;
        archive.write_document("section.html", html.as_bytes())?;
        let target = Target::new(options.title.clone().unwrap_or_default(), None);
        let mut attempted: Vec<String> = Vec::new();

        if !options.browse_stories {
            let page_feeds = self.pages.feed_links(&html, &classification.url);
            let hints = FeedHints {
                override_url: options.rss_url.as_deref(),
                explicit_slug: show,
                page_feeds: &page_feeds,
                derived_slugs: classification.show_slug.iter().cloned().collect(),
            };

            match self.discover_feed_source(page_url, &hints).await {
                Ok(found) => {
                    tracing::info!("Using section feed {}", found.url);
                    archive.write_document("section-feed.xml", &found.body)?;
                    let choice = self.rank_and_select(
                        &target,
                        &found.feed.candidates,
                        options.mode,
                        &archive,
                        "section-scores.json",
                    )?;
                    return match choice {
                        Choice::Listed(ranked) => Ok(Resolution::Ranked(ranked)),
                        Choice::Chosen {
                            candidate,
                            considered,
                        } if candidate.is_resolvable() => {
                            self.resolved(&candidate, considered, Some(&found), None)
                        }
                        Choice::Chosen { candidate, .. } => {
                            self.follow_story(&candidate, show, options).await
                        }
                    };
                }
                Err(ResolveError::NoFeedFound { attempted: tried, .. }) => {
                    tracing::warn!("No usable feed for {}, browsing story links", page_url);
                    attempted = tried;
                }
                Err(e @ (ResolveError::Fetch { .. } | ResolveError::Parse { .. })) => {
                    tracing::warn!("Section feed failed ({}), browsing story links", e);
                }
                Err(e) => return Err(e),
            }
        }

        let stories = self.pages.story_links(&html, &classification.url);
        if stories.is_empty() {
            return Err(ResolveError::NoFeedFound {
                url: page_url.to_string(),
                attempted,
            });
        }
        tracing::debug!("{} story links on {}", stories.len(), page_url);

        let candidates: Vec<EpisodeCandidate> = stories
            .into_iter()
            .enumerate()
            .map(|(ordinal, story)| EpisodeCandidate::new(story.title, ordinal).with_link(story.url))
            .collect();

        let choice = self.rank_and_select(
            &target,
            &candidates,
            options.mode,
            &archive,
            "section-scores.json",
        )?;
        match choice {
            Choice::Listed(ranked) => Ok(Resolution::Ranked(ranked)),
            Choice::Chosen { candidate, .. } => self.follow_story(&candidate, show, options).await,
        }
    }

    /// Resolves a selected candidate that has no enclosure through its story page.
    async fn follow_story(
        &self,
        candidate: &EpisodeCandidate,
        show: Option<&str>,
        options: &ResolveOptions,
    ) -> Result<Resolution> {
        let story = candidate
            .link
            .as_deref()
            .map(|link| classify(link, &self.config.site))
            .transpose()?
            .filter(Classification::is_story)
            .ok_or_else(|| ResolveError::AmbiguousSelection {
                reason: format!(
                    "selected item {:?} has neither an enclosure nor a story page",
                    candidate.display_title()
                ),
                ranked: Vec::new(),
            })?;

        let inner = ResolveOptions {
            mode: match options.mode {
                SelectionMode::Interactive => SelectionMode::Interactive,
                _ => SelectionMode::Automatic,
            },
            browse_stories: false,
            ..options.clone()
        };
        tracing::info!("Following story {}", story.url);
        self.resolve_story(&story, show, &inner).await
    }

    fn rank_and_select(
        &self,
        target: &Target,
        candidates: &[EpisodeCandidate],
        mode: SelectionMode,
        archive: &DebugArchive,
        scores_file: &str,
    ) -> Result<Choice> {
        let scores = self.matcher.score(target, candidates);
        for score in scores.iter().take(3) {
            tracing::debug!(
                "{:>6.2}  {}  [{}]",
                score.score,
                score.candidate.display_title(),
                score.reasons.join("; ")
            );
        }
        if archive.is_enabled() {
            archive.write_json(
                scores_file,
                &json!({
                    "target": target,
                    "ranked": to_ranked(&scores, scores.len()),
                }),
            )?;
        }

        match select(&scores, mode, self.matcher.config(), self.chooser.as_ref())? {
            Selection::Listed(ranked) => Ok(Choice::Listed(ranked)),
            Selection::Chosen(index) => Ok(Choice::Chosen {
                candidate: scores[index].candidate.clone(),
                considered: scores.len(),
            }),
        }
    }

    fn resolved(
        &self,
        candidate: &EpisodeCandidate,
        considered: usize,
        feed: Option<&DiscoveredFeed>,
        page: Option<&StoryPage>,
    ) -> Result<Resolution> {
        let Some(ref enclosure_url) = candidate.enclosure_url else {
            return Err(ResolveError::AmbiguousSelection {
                reason: format!("selected item {:?} has no enclosure", candidate.display_title()),
                ranked: Vec::new(),
            });
        };

        Ok(Resolution::Resolved {
            result: ResolvedResult {
                enclosure_url: enclosure_url.clone(),
                matched_title: candidate.title.clone(),
                resolved_at: self.clock.now(),
                candidates_considered: considered,
                feed_url: feed.map(|f| f.url.clone()),
                published_at: candidate.published_at,
                feed_title: feed.and_then(|f| f.feed.meta.title.clone()),
                description: candidate
                    .description
                    .clone()
                    .or_else(|| page.and_then(|p| p.description.clone())),
                image_url: page
                    .and_then(|p| p.image_url.clone())
                    .or_else(|| feed.and_then(|f| f.feed.meta.image_url.clone())),
            },
            from_cache: false,
        })
    }

    fn effective_show(&self, options: &ResolveOptions) -> Result<Option<String>> {
        if let Some(show) = options
            .show
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return Ok(Some(show.to_ascii_lowercase()));
        }

        match options.provider.as_deref() {
            None => Ok(None),
            Some(provider) if provider.eq_ignore_ascii_case("auto") => Ok(None),
            Some(provider) => self
                .config
                .provider_slug(provider)
                .map(|slug| Some(slug.to_string()))
                .ok_or_else(|| ResolveError::Config(format!("unknown provider {provider:?}"))),
        }
    }
}
