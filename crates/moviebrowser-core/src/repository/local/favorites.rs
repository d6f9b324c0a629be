//! SQLite-backed favorites table.

use crate::error::{MovieBrowserError, Result};
use crate::repository::{FavoriteStore, MovieData};
use async_trait::async_trait;
use chrono::Utc;
use moviebrowser_common::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Favorites persisted in SQLite.
///
/// Each row keeps a few indexed columns plus the full record as JSON.
/// Queries run on tokio's blocking pool.
pub struct SqliteFavoriteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFavoriteStore {
    /// Open (or create) the favorites database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MovieBrowserError::io_with_path(e, parent))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| MovieBrowserError::database("Failed to open favorites database", e))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| MovieBrowserError::database("Failed to set pragmas", e))?;

        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MovieBrowserError::database("Failed to open in-memory favorites", e))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS favorites (
                id INTEGER PRIMARY KEY,
                create_time INTEGER NOT NULL,
                title TEXT,
                poster TEXT,
                json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_favorites_create_time
                ON favorites(create_time);
            "#,
        )
        .map_err(|e| MovieBrowserError::database("Failed to initialize favorites schema", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| MovieBrowserError::Database {
                message: format!("Failed to lock database: {}", e),
                source: None,
            })?;
            query(&*guard)
        })
        .await?
    }
}

fn movie_from_row(row: &Row<'_>) -> rusqlite::Result<MovieData> {
    let id: EntityId = row.get(0)?;
    let title: Option<String> = row.get(1)?;
    let poster: Option<String> = row.get(2)?;
    let json: String = row.get(3)?;

    Ok(serde_json::from_str(&json).unwrap_or_else(|e| {
        warn!("Favorite {} has unreadable JSON, using indexed columns: {}", id, e);
        MovieData {
            id,
            title,
            poster_path: poster,
            ..Default::default()
        }
    }))
}

#[async_trait]
impl FavoriteStore for SqliteFavoriteStore {
    async fn all_favorite_movies(&self) -> Result<Vec<MovieData>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, poster, json FROM favorites ORDER BY create_time DESC",
                )
                .map_err(|e| MovieBrowserError::database("Failed to prepare favorites query", e))?;
            let movies = stmt
                .query_map([], movie_from_row)
                .map_err(|e| MovieBrowserError::database("Failed to query favorites", e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| MovieBrowserError::database("Failed to read favorite row", e))?;
            Ok(movies)
        })
        .await
    }

    async fn add_favorite_movie(&self, movie: &MovieData) -> Result<bool> {
        let movie = movie.clone();
        let json = serde_json::to_string(&movie)?;
        self.with_conn(move |conn| {
            // create_time stays strictly increasing so newest-first order is
            // stable even for inserts within the same millisecond.
            let written = conn
                .execute(
                    r#"
                    INSERT OR REPLACE INTO favorites (id, create_time, title, poster, json)
                    VALUES (
                        ?1,
                        MAX(?2, COALESCE((SELECT MAX(create_time) + 1 FROM favorites), 0)),
                        ?3, ?4, ?5
                    )
                    "#,
                    params![
                        movie.id,
                        Utc::now().timestamp_millis(),
                        movie.title,
                        movie.poster_path,
                        json
                    ],
                )
                .map_err(|e| MovieBrowserError::database("Failed to insert favorite", e))?;
            debug!("Stored favorite {}", movie.id);
            Ok(written > 0)
        })
        .await
    }

    async fn favorite_movie(&self, id: EntityId) -> Result<Option<MovieData>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, title, poster, json FROM favorites WHERE id = ?1",
                params![id],
                movie_from_row,
            )
            .optional()
            .map_err(|e| MovieBrowserError::database("Failed to query favorite", e))
        })
        .await
    }

    async fn delete_favorite_movie(&self, id: EntityId) -> Result<bool> {
        self.with_conn(move |conn| {
            let deleted = conn
                .execute("DELETE FROM favorites WHERE id = ?1", params![id])
                .map_err(|e| MovieBrowserError::database("Failed to delete favorite", e))?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn clear_data(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn
                .execute("DELETE FROM favorites", [])
                .map_err(|e| MovieBrowserError::database("Failed to clear favorites", e))?;
            debug!("Cleared {} favorites", deleted);
            Ok(true)
        })
        .await
    }
}
