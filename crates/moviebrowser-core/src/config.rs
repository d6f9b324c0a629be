//! Centralized configuration for the movie browser.
//!
//! This module provides configuration constants for the TMDb client, local
//! storage layout, image sizing and the data-cleaning pipeline.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "MovieBrowser";
    pub const USER_AGENT: &'static str = concat!("MovieBrowser/", env!("CARGO_PKG_VERSION"));
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const TMDB_API_BASE: &'static str = "https://api.themoviedb.org/3/";
    pub const QUERY_API_KEY: &'static str = "api_key";
    pub const QUERY_PAGE: &'static str = "page";

    // Debug builds fail fast so a dead network shows up immediately.
    pub const CONNECT_TIMEOUT: Duration = if cfg!(debug_assertions) {
        Duration::from_secs(1)
    } else {
        Duration::from_secs(5)
    };
    pub const REQUEST_TIMEOUT: Duration = if cfg!(debug_assertions) {
        Duration::from_secs(1)
    } else {
        Duration::from_secs(5)
    };

    pub const HTTP_CACHE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
    pub const HTTP_CACHE_TTL: Duration = Duration::from_secs(600);
}

/// Image URL defaults used before the remote configuration is known.
pub struct ImageDefaults;

impl ImageDefaults {
    pub const BASE_URL: &'static str = "http://image.tmdb.org/t/p/";
    pub const ORIGINAL: &'static str = "original";
    pub const DEFAULT_IMAGE_PATH: &'static str = "http://image.tmdb.org/t/p/original/";
    pub const SIZES_SEPARATOR: char = ':';
}

/// Data-cleaning pipeline timing.
pub struct CleanerConfig;

impl CleanerConfig {
    /// Minimum time each stage stays visible before the next one is emitted.
    pub const MIN_STAGE_DURATION: Duration = Duration::from_millis(800);
}

/// Shared directory and file names under the data directory.
pub struct PathsConfig;

impl PathsConfig {
    pub const DATA_DIR_NAME: &'static str = "moviebrowser";
    pub const CACHE_DIR_NAME: &'static str = "cache";
    pub const IMAGE_CACHE_DIR_NAME: &'static str = "images";
    pub const FAVORITES_DB_NAME: &'static str = "favorites.sqlite";
    pub const HTTP_CACHE_DB_NAME: &'static str = "http-cache.sqlite";
    pub const CONFIG_FILE_NAME: &'static str = "config.json";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_reasonable() {
        assert!(NetworkConfig::CONNECT_TIMEOUT > Duration::ZERO);
        assert!(NetworkConfig::REQUEST_TIMEOUT <= Duration::from_secs(5));
    }

    #[test]
    fn test_default_image_path_is_original_size() {
        assert_eq!(
            ImageDefaults::DEFAULT_IMAGE_PATH,
            format!("{}{}/", ImageDefaults::BASE_URL, ImageDefaults::ORIGINAL)
        );
    }
}
