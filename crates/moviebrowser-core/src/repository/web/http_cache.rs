//! SQLite-backed HTTP response cache.

use crate::config::NetworkConfig;
use crate::error::{MovieBrowserError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Cache sizing and expiry.
#[derive(Debug, Clone)]
pub struct HttpCacheConfig {
    /// Time-to-live for stored responses.
    pub ttl: Duration,
    /// Maximum total body size in bytes (0 = unlimited).
    pub max_size_bytes: u64,
}

impl Default for HttpCacheConfig {
    fn default() -> Self {
        Self {
            ttl: NetworkConfig::HTTP_CACHE_TTL,
            max_size_bytes: NetworkConfig::HTTP_CACHE_SIZE,
        }
    }
}

/// Response bodies keyed by request URL.
///
/// Entries expire after the configured TTL and the least recently used ones
/// are evicted once the total size exceeds the limit. All operations are
/// synchronous to match rusqlite's API.
pub struct HttpCache {
    conn: Arc<Mutex<Connection>>,
    config: HttpCacheConfig,
}

impl HttpCache {
    /// Open (or create) the cache database at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(db_path, HttpCacheConfig::default())
    }

    pub fn with_config(db_path: impl AsRef<Path>, config: HttpCacheConfig) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MovieBrowserError::io_with_path(e, parent))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| MovieBrowserError::database("Failed to open HTTP cache database", e))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| MovieBrowserError::database("Failed to set pragmas", e))?;

        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| MovieBrowserError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                url TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                cached_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                last_accessed TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_responses_expires
                ON responses(expires_at);

            CREATE INDEX IF NOT EXISTS idx_responses_accessed
                ON responses(last_accessed);
            "#,
        )
        .map_err(|e| MovieBrowserError::database("Failed to initialize cache schema", e))
    }

    /// Fresh body for `url`, if any. Touches the entry's access time.
    pub fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let body: Option<Vec<u8>> = conn
            .query_row(
                "SELECT body FROM responses WHERE url = ?1 AND expires_at > ?2",
                params![url, now],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| MovieBrowserError::database("Failed to query cached response", e))?;

        if body.is_some() {
            let _ = conn.execute(
                "UPDATE responses SET last_accessed = ?1 WHERE url = ?2",
                params![now, url],
            );
        }

        Ok(body)
    }

    /// Store a body using the configured TTL.
    pub fn put(&self, url: &str, body: &[u8]) -> Result<()> {
        let expires_at = Utc::now() + chrono::Duration::from_std(self.config.ttl).unwrap_or_default();
        self.put_with_expiry(url, body, expires_at)
    }

    pub fn put_with_expiry(&self, url: &str, body: &[u8], expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT OR REPLACE INTO responses
            (url, body, cached_at, expires_at, size_bytes, last_accessed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![url, body, now, expires_at.to_rfc3339(), body.len() as i64, now],
        )
        .map_err(|e| MovieBrowserError::database("Failed to store response", e))?;

        if self.config.max_size_bytes > 0 {
            let evicted = Self::evict_to_size(&conn, self.config.max_size_bytes)?;
            if evicted > 0 {
                debug!("Evicted {} cached responses to stay under size limit", evicted);
            }
        }

        Ok(())
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))
            .map_err(|e| MovieBrowserError::database("Failed to count responses", e))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total stored body size in bytes.
    pub fn size_bytes(&self) -> Result<u64> {
        let conn = self.lock()?;
        let size: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(size_bytes), 0) FROM responses",
                [],
                |row| row.get(0),
            )
            .map_err(|e| MovieBrowserError::database("Failed to sum response sizes", e))?;
        Ok(size as u64)
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM responses WHERE expires_at <= ?1",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(|e| MovieBrowserError::database("Failed to remove expired responses", e))?;

        if deleted > 0 {
            debug!("Cleaned up {} expired responses", deleted);
        }
        Ok(deleted)
    }

    /// Remove everything. Returns how many entries were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM responses", [])
            .map_err(|e| MovieBrowserError::database("Failed to clear responses", e))?;
        debug!("Cleared {} cached responses", deleted);
        Ok(deleted)
    }

    // Least recently accessed entries go first.
    fn evict_to_size(conn: &Connection, max_bytes: u64) -> Result<usize> {
        let current_size: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(size_bytes), 0) FROM responses",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if (current_size as u64) <= max_bytes {
            return Ok(0);
        }
        let excess = current_size as u64 - max_bytes;

        let mut stmt = conn
            .prepare("SELECT url, size_bytes FROM responses ORDER BY last_accessed ASC")
            .map_err(|e| MovieBrowserError::database("Failed to prepare eviction query", e))?;

        let entries: Vec<(String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| MovieBrowserError::database("Failed to query for eviction", e))?
            .filter_map(|r| r.ok())
            .collect();

        let mut evicted_bytes = 0u64;
        let mut evicted_count = 0;
        for (url, size) in entries {
            if evicted_bytes >= excess {
                break;
            }
            conn.execute("DELETE FROM responses WHERE url = ?1", params![url])
                .map_err(|e| MovieBrowserError::database("Failed to evict response", e))?;
            evicted_bytes += size as u64;
            evicted_count += 1;
        }

        Ok(evicted_count)
    }
}
