//! # podlocate
//!
//! Resolves a radio story or show page to the podcast audio file behind it.
//!
//! ## Architecture
//!
//! A resolution is a short sequential pipeline:
//!
//! ```text
//! Classifier → Cache → Feed discovery → Feed/Page parsers → Matcher → Selection → Cache
//! ```
//!
//! - [`classifier`]: story page or section page, and the show slug
//! - [`resolver`]: feed discovery, matching and the selection policy
//! - [`store`]: SQLite cache of resolved enclosures with a TTL
//!
//! ## Quick Start
//!
//! ```bash
//! # Resolve a story to its enclosure URL
//! podlocate resolve https://www.cbc.ca/radio/ideas/injustice-for-all-1.7045123
//!
//! # Show the ranked candidates instead
//! podlocate resolve --list 5 https://www.cbc.ca/radio/ideas/injustice-for-all-1.7045123
//!
//! # Pick interactively from a show page
//! podlocate resolve --interactive https://www.cbc.ca/radio/ideas/
//!
//! # Re-resolve, ignoring the cache
//! podlocate resolve --repair https://www.cbc.ca/radio/ideas/injustice-for-all-1.7045123
//!
//! # Keep the fetched pages, feed and scores for inspection
//! podlocate resolve --debug=./trace https://www.cbc.ca/radio/ideas/injustice-for-all-1.7045123
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: TOML configuration with defaults
//! - [`domain`]: Candidates, resolution keys and results
//! - [`fetcher`]: HTTP fetching with retries
//! - [`matcher`]: Candidate scoring
//! - [`parser`]: Feed and HTML page parsing

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the cache,
/// the HTTP fetcher and the resolver.
pub mod app;

/// URL classification into story and section pages.
pub mod classifier;

/// Command-line interface using clap.
///
/// - `resolve <url>` - Resolve a page to its enclosure
/// - `discover <url>` - Print the feed a page links to
/// - `stories <url>` - List story links on a show page
/// - `shows <url>` - List shows
/// - `cache clear|forget` - Manage the resolution cache
pub mod cli;

/// Injectable time source.
pub mod clock;

/// Configuration management.
///
/// Loads from `~/.config/podlocate/config.toml`, supporting:
/// - Site layout (base URL, path prefixes, podcast index)
/// - Provider presets
/// - Matching weights and thresholds
/// - Fetch timeouts, retries and cache TTL
pub mod config;

/// Core domain models.
///
/// - [`EpisodeCandidate`](domain::EpisodeCandidate): A feed item or story link
/// - [`ResolutionKey`](domain::ResolutionKey): Cache identity of a request
/// - [`ResolvedResult`](domain::ResolvedResult): The chosen enclosure
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for single fetch attempts
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`RetryingFetcher`](fetcher::RetryingFetcher): Bounded retries with backoff
pub mod fetcher;

/// Deterministic candidate scoring by title overlap, part number and date.
pub mod matcher;

/// Feed parsing (RSS 0.9x/1.0/2.0, Atom, JSON Feed) and HTML extraction.
pub mod parser;

/// The resolution pipeline.
pub mod resolver;

/// SQLite cache of resolved results.
///
/// - [`Cache`](store::Cache): Trait defining cache operations
/// - [`SqliteCache`](store::SqliteCache): SQLite implementation
pub mod store;
