//! Builder for configuring MovieBrowser initialization.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PathsConfig;
use crate::error::{MovieBrowserError, Result};
use crate::models::{EntityStore, FavoriteMovieCollection, NowPlayingCollection, TmdbConfig};
use crate::repository::{
    ConfigStore, DiskImageCache, FavoriteStore, HttpCache, ImageCache, JsonConfigStore,
    MovieDbService, SqliteFavoriteStore, TmdbClient,
};
use crate::MovieBrowser;

/// Builder for configuring MovieBrowser initialization.
///
/// # Example
///
/// ```rust,ignore
/// use moviebrowser_core::MovieBrowser;
///
/// let browser = MovieBrowser::builder("./data")
///     .api_key(std::env::var("TMDB_API_KEY")?)
///     .auto_create_dirs(true)
///     .fetch_configuration(false)
///     .build()
///     .await?;
/// ```
pub struct MovieBrowserBuilder {
    data_dir: PathBuf,
    api_key: Option<String>,
    base_url: Option<String>,
    auto_create_dirs: bool,
    fetch_configuration: bool,
    movie_db: Option<Arc<dyn MovieDbService>>,
    favorite_store: Option<Arc<dyn FavoriteStore>>,
    config_store: Option<Arc<dyn ConfigStore>>,
    image_cache: Option<Arc<dyn ImageCache>>,
}

impl MovieBrowserBuilder {
    /// Create a new builder with the data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            api_key: None,
            base_url: None,
            auto_create_dirs: false,
            fetch_configuration: true,
            movie_db: None,
            favorite_store: None,
            config_store: None,
            image_cache: None,
        }
    }

    /// TMDb v3 API key. Required unless a movie source is injected.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Talk to a different TMDb-compatible endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Auto-create the data directory and its cache directories.
    ///
    /// Default: `false` (the data directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Refresh the image configuration from TMDb during `build`.
    ///
    /// A failed fetch is logged and the stored configuration is used.
    ///
    /// Default: `true`
    pub fn fetch_configuration(mut self, enable: bool) -> Self {
        self.fetch_configuration = enable;
        self
    }

    pub fn with_movie_db(mut self, movie_db: Arc<dyn MovieDbService>) -> Self {
        self.movie_db = Some(movie_db);
        self
    }

    pub fn with_favorite_store(mut self, favorite_store: Arc<dyn FavoriteStore>) -> Self {
        self.favorite_store = Some(favorite_store);
        self
    }

    pub fn with_config_store(mut self, config_store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = Some(config_store);
        self
    }

    pub fn with_image_cache(mut self, image_cache: Arc<dyn ImageCache>) -> Self {
        self.image_cache = Some(image_cache);
        self
    }

    fn cache_dir(data_dir: &Path) -> PathBuf {
        data_dir.join(PathsConfig::CACHE_DIR_NAME)
    }

    /// Create the required directory structure.
    fn create_directory_structure(data_dir: &Path) -> Result<()> {
        let cache_dir = Self::cache_dir(data_dir);
        let dirs = [
            data_dir.to_path_buf(),
            cache_dir.clone(),
            cache_dir.join(PathsConfig::IMAGE_CACHE_DIR_NAME),
        ];

        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| MovieBrowserError::Io {
                    message: format!("Failed to create directory: {}", dir.display()),
                    path: Some(dir.clone()),
                    source: Some(Arc::new(e)),
                })?;
            }
        }

        Ok(())
    }

    fn build_movie_db(
        data_dir: &Path,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Arc<dyn MovieDbService>> {
        let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
            MovieBrowserError::Config {
                message: "A TMDb API key is required".to_string(),
            }
        })?;

        // The response cache is an optimization; run without it if it fails.
        let cache_db = Self::cache_dir(data_dir).join(PathsConfig::HTTP_CACHE_DB_NAME);
        let cache = match HttpCache::new(&cache_db) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                tracing::warn!("Failed to initialize HTTP cache: {}", e);
                None
            }
        };

        let client = match base_url {
            Some(base_url) => TmdbClient::with_base_url(&base_url, api_key, cache)?,
            None => TmdbClient::new(api_key, cache)?,
        };
        Ok(Arc::new(client))
    }

    /// Build the MovieBrowser instance.
    pub async fn build(self) -> Result<MovieBrowser> {
        if self.auto_create_dirs {
            Self::create_directory_structure(&self.data_dir)?;
        } else if !self.data_dir.exists() {
            return Err(MovieBrowserError::Config {
                message: format!("Data directory does not exist: {}", self.data_dir.display()),
            });
        }

        let movie_db = match self.movie_db {
            Some(movie_db) => movie_db,
            None => Self::build_movie_db(&self.data_dir, self.api_key, self.base_url)?,
        };

        let favorite_store: Arc<dyn FavoriteStore> = match self.favorite_store {
            Some(store) => store,
            None => {
                let db_path = self.data_dir.join(PathsConfig::FAVORITES_DB_NAME);
                let store = tokio::task::spawn_blocking(move || SqliteFavoriteStore::open(db_path))
                    .await??;
                Arc::new(store)
            }
        };

        let config_store: Arc<dyn ConfigStore> = match self.config_store {
            Some(store) => store,
            None => Arc::new(JsonConfigStore::open(
                self.data_dir.join(PathsConfig::CONFIG_FILE_NAME),
            )),
        };

        let image_cache: Arc<dyn ImageCache> = match self.image_cache {
            Some(cache) => cache,
            None => Arc::new(DiskImageCache::new(
                Self::cache_dir(&self.data_dir).join(PathsConfig::IMAGE_CACHE_DIR_NAME),
            )),
        };

        let entity_store = EntityStore::new(movie_db.clone());
        let now_playing = NowPlayingCollection::now_playing(movie_db.clone(), entity_store.clone());
        let favorites = FavoriteMovieCollection::new(favorite_store.clone(), entity_store.clone());
        let tmdb_config = Arc::new(TmdbConfig::new(movie_db.clone(), config_store.clone()));

        if self.fetch_configuration {
            // Logged inside init; stale image sizes are not fatal.
            let _ = tmdb_config.init().await;
        }

        tracing::info!("Movie browser ready at {}", self.data_dir.display());

        Ok(MovieBrowser {
            data_dir: self.data_dir,
            movie_db,
            favorite_store,
            config_store,
            image_cache,
            entity_store,
            now_playing,
            favorites,
            tmdb_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieCollection;
    use crate::testing::FakeMovieDb;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_data_dir_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = MovieBrowser::builder(temp_dir.path().join("absent"))
            .with_movie_db(Arc::new(FakeMovieDb::default()))
            .build()
            .await;

        assert!(matches!(result, Err(MovieBrowserError::Config { .. })));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = MovieBrowser::builder(temp_dir.path())
            .fetch_configuration(false)
            .build()
            .await;

        assert!(matches!(result, Err(MovieBrowserError::Config { .. })));
    }

    #[tokio::test]
    async fn test_auto_create_dirs_lays_out_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("browser");

        let browser = MovieBrowser::builder(&data_dir)
            .auto_create_dirs(true)
            .with_movie_db(Arc::new(FakeMovieDb::default()))
            .build()
            .await
            .unwrap();

        assert_eq!(browser.data_dir(), data_dir.as_path());
        assert!(data_dir.join("cache").join("images").is_dir());
        assert!(data_dir.join(PathsConfig::FAVORITES_DB_NAME).exists());
    }

    #[tokio::test]
    async fn test_real_client_is_built_from_api_key() {
        let temp_dir = TempDir::new().unwrap();
        let browser = MovieBrowser::builder(temp_dir.path())
            .api_key("secret")
            .base_url("http://127.0.0.1:9")
            .fetch_configuration(false)
            .build()
            .await
            .unwrap();

        assert!(temp_dir
            .path()
            .join("cache")
            .join(PathsConfig::HTTP_CACHE_DB_NAME)
            .exists());
        assert!(browser.favorites().is_empty());
    }
}
