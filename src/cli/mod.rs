pub mod commands;
pub mod prompt;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::resolver::{ResolveOptions, SelectionMode};

#[derive(Parser)]
#[command(name = "podlocate")]
#[command(about = "Find the podcast audio behind a radio story or show page", long_about = None)]
pub struct Cli {
    /// Log discovery steps and candidate scores
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.config/podlocate/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a story or show URL to its audio enclosure
    Resolve(ResolveArgs),
    /// Print the first feed a page links to
    Discover {
        /// Page URL
        url: String,
    },
    /// List story links on a show page
    Stories {
        /// Show page URL
        url: String,
        /// Maximum number of stories
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// List shows linked from a page, plus the podcast index
    Shows {
        /// Page URL
        url: String,
        /// Maximum number of shows
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the resolution cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Story or show page URL
    pub url: String,

    /// Use this feed instead of discovering one
    #[arg(long, value_name = "URL")]
    pub rss_url: Option<String>,

    /// Show slug whose feed to use (e.g. "ideas")
    #[arg(long)]
    pub show: Option<String>,

    /// Provider preset (ideas, thecurrent, q, asithappens, day6, auto)
    #[arg(long)]
    pub provider: Option<String>,

    /// Match this title instead of the page's
    #[arg(long)]
    pub title: Option<String>,

    /// List the top N candidates instead of resolving
    #[arg(long, value_name = "N", conflicts_with_all = ["interactive", "pick"])]
    pub list: Option<usize>,

    /// Choose among the candidates interactively
    #[arg(short, long, conflicts_with = "pick")]
    pub interactive: bool,

    /// Take the candidate at this rank (1-based)
    #[arg(long, value_name = "N")]
    pub pick: Option<usize>,

    /// Pick from the page's story links even if it has a feed
    #[arg(long)]
    pub browse_stories: bool,

    /// Seconds a cached result stays fresh
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    /// Ignore the cached result and resolve again
    #[arg(long)]
    pub repair: bool,

    /// Keep fetched pages, feeds and scores in DIR (default ./podlocate-debug-<unix time>)
    #[arg(long, value_name = "DIR", require_equals = true)]
    pub debug: Option<Option<PathBuf>>,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    pub fn options(&self) -> ResolveOptions {
        let mode = if let Some(n) = self.list {
            SelectionMode::List(n)
        } else if self.interactive {
            SelectionMode::Interactive
        } else if let Some(rank) = self.pick {
            SelectionMode::NonInteractive(rank)
        } else {
            SelectionMode::Automatic
        };

        ResolveOptions {
            rss_url: self.rss_url.clone(),
            show: self.show.clone(),
            provider: self.provider.clone(),
            title: self.title.clone(),
            mode,
            browse_stories: self.browse_stories,
            cache_ttl: self.cache_ttl.map(Duration::from_secs),
            repair: self.repair,
            debug_dir: self
                .debug
                .as_ref()
                .map(|dir| dir.clone().unwrap_or_else(default_debug_dir)),
        }
    }
}

fn default_debug_dir() -> PathBuf {
    PathBuf::from(format!("podlocate-debug-{}", chrono::Utc::now().timestamp()))
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove every cached resolution
    Clear,
    /// Remove the cached resolution of one URL
    Forget {
        /// URL as given to `resolve`
        url: String,
        /// Show slug given to `resolve`
        #[arg(long)]
        show: Option<String>,
        /// Provider preset given to `resolve`
        #[arg(long)]
        provider: Option<String>,
        /// Title override given to `resolve`
        #[arg(long)]
        title: Option<String>,
    },
}
