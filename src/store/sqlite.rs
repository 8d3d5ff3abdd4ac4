use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{ResolveError, Result};
use crate::clock::Clock;
use crate::domain::{ResolutionKey, ResolvedResult};
use crate::store::Cache;

pub struct SqliteCache {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SqliteCache {
    pub fn new<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock + Send + Sync>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Mutex::new(conn),
            clock,
        };
        cache.run_migrations()?;
        Ok(cache)
    }

    pub fn in_memory(clock: Arc<dyn Clock + Send + Sync>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            conn: Mutex::new(conn),
            clock,
        };
        cache.run_migrations()?;
        Ok(cache)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![
            M::up(include_str!("../../migrations/001-initial/up.sql")),
            M::up(include_str!("../../migrations/002-episode-details/up.sql")),
        ]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| ResolveError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            ResolveError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

impl Cache for SqliteCache {
    fn get(&self, key: &ResolutionKey, ttl: Duration) -> Result<Option<ResolvedResult>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT enclosure_url, matched_title, feed_url, published_at,
                        candidates_considered, resolved_at, written_at,
                        feed_title, description, image_url
                 FROM resolutions WHERE key = ?1",
                params![key.digest()],
                |row| {
                    Ok((
                        ResolvedResult {
                            enclosure_url: row.get(0)?,
                            matched_title: row.get(1)?,
                            feed_url: row.get(2)?,
                            published_at: row
                                .get::<_, Option<String>>(3)?
                                .and_then(|s| Self::parse_datetime(&s)),
                            candidates_considered: row.get::<_, i64>(4)?.max(0) as usize,
                            resolved_at: row
                                .get::<_, String>(5)
                                .ok()
                                .and_then(|s| Self::parse_datetime(&s))
                                .unwrap_or_default(),
                            feed_title: row.get(7)?,
                            description: row.get(8)?,
                            image_url: row.get(9)?,
                        },
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((result, written_at)) = row else {
            return Ok(None);
        };
        let Some(written_at) = Self::parse_datetime(&written_at) else {
            tracing::warn!("Ignoring cache entry for {} with unreadable timestamp", key.url);
            return Ok(None);
        };

        let age = self.clock.now() - written_at;
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        if age >= ttl {
            tracing::debug!("Cache entry for {} is stale ({}s old)", key.url, age.num_seconds());
            return Ok(None);
        }

        Ok(Some(result))
    }

    fn put(&self, key: &ResolutionKey, result: &ResolvedResult) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO resolutions (key, url, show, title, enclosure_url, matched_title, feed_url,
                                      published_at, candidates_considered, resolved_at, written_at,
                                      feed_title, description, image_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(key) DO UPDATE SET
                enclosure_url = excluded.enclosure_url,
                matched_title = excluded.matched_title,
                feed_url = excluded.feed_url,
                published_at = excluded.published_at,
                candidates_considered = excluded.candidates_considered,
                resolved_at = excluded.resolved_at,
                written_at = excluded.written_at,
                feed_title = excluded.feed_title,
                description = excluded.description,
                image_url = excluded.image_url",
            params![
                key.digest(),
                key.url,
                key.show,
                key.title,
                result.enclosure_url,
                result.matched_title,
                result.feed_url,
                result.published_at.map(|dt| dt.to_rfc3339()),
                result.candidates_considered as i64,
                result.resolved_at.to_rfc3339(),
                self.clock.now().to_rfc3339(),
                result.feed_title,
                result.description,
                result.image_url,
            ],
        )?;

        Ok(())
    }

    fn invalidate(&self, key: &ResolutionKey) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM resolutions WHERE key = ?1",
            params![key.digest()],
        )?;
        Ok(removed > 0)
    }

    fn purge(&self) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM resolutions", [])?;
        Ok(removed)
    }
}
