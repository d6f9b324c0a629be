//! MovieBrowser Core - Headless model layer for browsing TMDb movies.
//!
//! This crate keeps one canonical [`Movie`](models::Movie) per movie id,
//! exposes observable, incrementally loaded movie lists (now playing, similar
//! movies, favorites) and persists favorites and settings locally. It has no
//! UI; front ends subscribe to the collections and render what they see.
//!
//! # Example
//!
//! ```rust,ignore
//! use moviebrowser_core::{MovieBrowser, MovieCollection};
//!
//! #[tokio::main]
//! async fn main() -> moviebrowser_core::Result<()> {
//!     let browser = MovieBrowser::builder("/path/to/data")
//!         .api_key("tmdb-api-key")
//!         .auto_create_dirs(true)
//!         .build()
//!         .await?;
//!
//!     let now_playing = browser.now_playing();
//!     now_playing.load().await?;
//!     for movie in now_playing.movies() {
//!         println!("{} ({})", movie.title(), movie.id());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod repository;

mod api;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{MovieBrowserError, Result};
pub use models::{
    CleaningStage, CollectionAction, CollectionObserver, Completion, DataCleaner, Details,
    EntityStore, FavoriteMovieCollection, ImageConfig, Movie, MovieCollection,
    MovieCollectionObserver, NowPlayingCollection, ObjectObserver, SimilarMovieCollection,
    TmdbConfig,
};
pub use moviebrowser_common::EntityId;
pub use repository::{
    ConfigStore, DiskImageCache, FavoriteStore, ImageCache, JsonConfigStore, MovieData,
    MovieDbService, SqliteFavoriteStore, TmdbClient,
};

// Re-export builder from api module
pub use api::MovieBrowserBuilder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main entry point: the wired-up model layer for one data directory.
pub struct MovieBrowser {
    data_dir: PathBuf,
    movie_db: Arc<dyn MovieDbService>,
    favorite_store: Arc<dyn FavoriteStore>,
    config_store: Arc<dyn ConfigStore>,
    image_cache: Arc<dyn ImageCache>,
    entity_store: Arc<EntityStore>,
    now_playing: NowPlayingCollection,
    favorites: FavoriteMovieCollection,
    tmdb_config: Arc<TmdbConfig>,
}

impl MovieBrowser {
    /// Create a builder for MovieBrowser.
    ///
    /// Use the builder to choose the API key, to create directories
    /// automatically or to inject collaborators (tests, alternative
    /// backends).
    pub fn builder(data_dir: impl Into<PathBuf>) -> MovieBrowserBuilder {
        MovieBrowserBuilder::new(data_dir)
    }

    /// Open `data_dir` with default options, creating it if needed.
    pub async fn new(data_dir: impl Into<PathBuf>, api_key: impl Into<String>) -> Result<Self> {
        Self::builder(data_dir)
            .api_key(api_key)
            .auto_create_dirs(true)
            .build()
            .await
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn movie_db(&self) -> &Arc<dyn MovieDbService> {
        &self.movie_db
    }

    pub fn favorite_store(&self) -> &Arc<dyn FavoriteStore> {
        &self.favorite_store
    }

    pub fn config_store(&self) -> &Arc<dyn ConfigStore> {
        &self.config_store
    }

    pub fn entity_store(&self) -> &Arc<EntityStore> {
        &self.entity_store
    }

    /// The global now-playing list. Every call returns the same list.
    pub fn now_playing(&self) -> &NowPlayingCollection {
        &self.now_playing
    }

    pub fn favorites(&self) -> &FavoriteMovieCollection {
        &self.favorites
    }

    /// Image URL configuration, refreshed from TMDb at build time.
    pub fn image_config(&self) -> &Arc<TmdbConfig> {
        &self.tmdb_config
    }
}
