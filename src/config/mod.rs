//! Configuration management for podlocate.
//!
//! Configuration is read from `~/.config/podlocate/config.toml` at startup
//! (or the path given with `--config`). If the file doesn't exist, a default
//! configuration with comments is created.

pub mod matching;
pub mod site;

pub use matching::MatchConfig;
pub use site::{default_providers, slug_variants, SiteConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub providers: BTreeMap<String, String>,
    pub matching: MatchConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            providers: default_providers(),
            matching: MatchConfig::default(),
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// HTTP behaviour of the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Extra attempts after the first failure (default: 2)
    pub retries: u32,
    /// First backoff delay in milliseconds, doubled per attempt (default: 500)
    pub backoff_ms: u64,
    /// Upper bound for a single backoff delay (default: 8000)
    pub max_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 2,
            backoff_ms: 500,
            max_backoff_ms: 8000,
            user_agent: format!("podlocate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolution cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a resolved result stays fresh (default: 3600)
    pub ttl_secs: u64,
    /// Database location; defaults to the user data directory
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            path: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Config {
    /// Load configuration from `path`, or the default location when `None`.
    ///
    /// A missing file is created with the commented defaults. Missing fields
    /// in an existing file use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/podlocate/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("podlocate").join("config.toml"))
    }

    /// Cache database location, falling back to the user data directory.
    pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.cache.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("podlocate").join("cache.db"))
    }

    /// Preset slug for a provider name. `auto` means no preset.
    pub fn provider_slug(&self, provider: &str) -> Option<&str> {
        if provider.eq_ignore_ascii_case("auto") {
            return None;
        }
        self.providers
            .get(&provider.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# podlocate configuration

[site]
# Scheme and host used to absolutize relative links
base_url = "https://www.cbc.ca"
# Show and story pages live under this prefix; the next segment is the show slug
story_prefix = "/radio/"
# Canonical feeds are <base_url><feed_prefix><slug>.xml
feed_prefix = "/podcasting/includes/"
# Page listing every podcast feed, used when a story page links no feed
podcast_index_url = "https://www.cbc.ca/podcasting/"
reserved_slugs = ["radio", "podcastnews", "podcasts", "listen"]

[providers]
# Preset name = show slug
ideas = "ideas"
thecurrent = "thecurrent"
q = "q"
asithappens = "asithappens"
day6 = "day6"

[matching]
overlap_weight = 10.0
part_bonus = 5.0
part_penalty = 3.0
date_weight = 3.0
date_window_days = 30.0
# Automatic selection needs a top score above this
min_confidence = 1.0
# Two candidates this close to the top score are ambiguous
ambiguity_epsilon = 0.1

[fetch]
timeout_secs = 30
retries = 2
backoff_ms = 500
max_backoff_ms = 8000

[cache]
# Seconds a resolved enclosure stays fresh
ttl_secs = 3600
# path = "/path/to/cache.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
