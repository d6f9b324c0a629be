//! Image URL construction from TMDb's configuration.

use crate::config::ImageDefaults;
use crate::error::Result;
use crate::repository::{ConfigKeys, ConfigStore, MovieDbService};
use moviebrowser_common::recover;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Picks the base URL for an image of a given display width.
pub trait ImageConfig: Send + Sync {
    fn backdrop_base_url(&self, width: i32) -> String;

    fn poster_base_url(&self, width: i32) -> String;
}

/// One image family's base URL and available sizes, smallest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSizesConfig {
    base_url: String,
    sizes: Vec<String>,
    widths: Vec<i32>,
}

impl ImageSizesConfig {
    pub fn new<I, T>(base_url: impl Into<String>, sizes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let sizes: Vec<String> = sizes.into_iter().map(Into::into).collect();
        let widths = sizes.iter().map(|s| parse_width(s)).collect();
        Self {
            base_url: base_url.into(),
            sizes,
            widths,
        }
    }

    /// Build from the `:`-joined form kept in the config store.
    pub fn from_joined(base_url: impl Into<String>, joined: &str) -> Self {
        Self::new(
            base_url,
            joined
                .split(ImageDefaults::SIZES_SEPARATOR)
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sizes(&self) -> &[String] {
        &self.sizes
    }

    pub fn joined_sizes(&self) -> String {
        self.sizes
            .join(&*ImageDefaults::SIZES_SEPARATOR.to_string())
    }

    /// `"{base}{size}/"` for the smallest size at least `width` wide.
    pub fn image_base_url(&self, width: i32) -> String {
        self.widths
            .iter()
            .position(|&w| w >= width)
            .map(|i| format!("{}{}/", self.base_url, self.sizes[i]))
            .unwrap_or_else(|| ImageDefaults::DEFAULT_IMAGE_PATH.to_string())
    }

    pub fn same_as(&self, other: &ImageSizesConfig) -> bool {
        self.base_url == other.base_url && self.joined_sizes() == other.joined_sizes()
    }
}

/// `w342` is 342 pixels wide, `original` is unbounded, anything else is unusable.
fn parse_width(size: &str) -> i32 {
    if size == ImageDefaults::ORIGINAL {
        return i32::MAX;
    }
    size.strip_prefix('w')
        .and_then(|w| w.parse().ok())
        .unwrap_or(-1)
}

struct ImageSizes {
    backdrop: ImageSizesConfig,
    poster: ImageSizesConfig,
}

/// [`ImageConfig`] backed by the persisted TMDb configuration.
pub struct TmdbConfig {
    movie_db: Arc<dyn MovieDbService>,
    config_store: Arc<dyn ConfigStore>,
    sizes: RwLock<ImageSizes>,
}

impl TmdbConfig {
    /// Start from whatever a previous run saved.
    pub fn new(movie_db: Arc<dyn MovieDbService>, config_store: Arc<dyn ConfigStore>) -> Self {
        let base_url = config_store
            .config_item(ConfigKeys::TMDB_IMAGE_BASE_URL)
            .unwrap_or_else(|| ImageDefaults::BASE_URL.to_string());
        let load = |key: &str| {
            let sizes = config_store.config_item(key).unwrap_or_default();
            ImageSizesConfig::from_joined(base_url.clone(), &sizes)
        };
        let sizes = ImageSizes {
            backdrop: load(ConfigKeys::TMDB_BACKDROP_SIZES),
            poster: load(ConfigKeys::TMDB_POSTER_SIZES),
        };

        Self {
            movie_db,
            config_store,
            sizes: RwLock::new(sizes),
        }
    }

    pub fn backdrop_sizes(&self) -> ImageSizesConfig {
        recover(self.sizes.read()).backdrop.clone()
    }

    pub fn poster_sizes(&self) -> ImageSizesConfig {
        recover(self.sizes.read()).poster.clone()
    }

    /// Refresh from the remote configuration.
    ///
    /// On failure the previously stored values stay in effect.
    pub async fn init(&self) -> Result<()> {
        let configuration = match self.movie_db.configuration().await {
            Ok(configuration) => configuration,
            Err(e) => {
                warn!("Failed to fetch TMDb configuration: {}", e);
                return Err(e);
            }
        };
        let Some(images) = configuration.images else {
            debug!("TMDb configuration has no image section");
            return Ok(());
        };

        let base_url = images
            .base_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| ImageDefaults::BASE_URL.to_string());
        let backdrop = ImageSizesConfig::new(base_url.clone(), images.backdrop_sizes);
        let poster = ImageSizesConfig::new(base_url.clone(), images.poster_sizes);

        self.update_and_save(base_url, backdrop, poster)
    }

    fn update_and_save(
        &self,
        base_url: String,
        backdrop: ImageSizesConfig,
        poster: ImageSizesConfig,
    ) -> Result<()> {
        let mut sizes = recover(self.sizes.write());

        if sizes.backdrop.base_url() != base_url {
            self.config_store
                .save_config_item(ConfigKeys::TMDB_IMAGE_BASE_URL, &base_url)?;
        }
        if !sizes.backdrop.same_as(&backdrop) {
            self.config_store
                .save_config_item(ConfigKeys::TMDB_BACKDROP_SIZES, &backdrop.joined_sizes())?;
            sizes.backdrop = backdrop;
        }
        if !sizes.poster.same_as(&poster) {
            self.config_store
                .save_config_item(ConfigKeys::TMDB_POSTER_SIZES, &poster.joined_sizes())?;
            sizes.poster = poster;
        }
        debug!("Image configuration up to date ({})", base_url);
        Ok(())
    }
}

impl ImageConfig for TmdbConfig {
    fn backdrop_base_url(&self, width: i32) -> String {
        recover(self.sizes.read()).backdrop.image_base_url(width)
    }

    fn poster_base_url(&self, width: i32) -> String {
        recover(self.sizes.read()).poster.image_base_url(width)
    }
}
