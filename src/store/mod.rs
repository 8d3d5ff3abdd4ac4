pub mod sqlite;

use std::time::Duration;

use crate::app::Result;
use crate::domain::{ResolutionKey, ResolvedResult};

pub use sqlite::SqliteCache;

/// Durable store of resolved results.
pub trait Cache {
    /// A fresh entry for `key`; entries at least `ttl` old are misses.
    fn get(&self, key: &ResolutionKey, ttl: Duration) -> Result<Option<ResolvedResult>>;
    /// Inserts or replaces the entry for `key`.
    fn put(&self, key: &ResolutionKey, result: &ResolvedResult) -> Result<()>;
    /// Removes the entry for `key`. Returns whether one existed.
    fn invalidate(&self, key: &ResolutionKey) -> Result<bool>;
    /// Removes every entry. Returns how many were removed.
    fn purge(&self) -> Result<usize>;
}
