use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::Result;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::resolver::{Chooser, Resolver};
use crate::store::{Cache, SqliteCache};

pub struct AppContext {
    pub resolver: Resolver,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = Self::db_path(&config)?;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
        let cache: Arc<dyn Cache + Send + Sync> = Arc::new(SqliteCache::new(&db_path, clock.clone())?);
        tracing::debug!("Using cache at {}", db_path.display());

        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let resolver = Resolver::new(config, fetcher, cache, clock)?;

        Ok(Self { resolver })
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser + Send + Sync>) -> Self {
        self.resolver = self.resolver.with_chooser(chooser);
        self
    }

    fn db_path(config: &Config) -> Result<PathBuf> {
        let path = config.cache_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}
