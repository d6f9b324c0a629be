//! Collaborators the model layer consumes.
//!
//! The model layer depends only on the traits below. `web` and `local` hold
//! the concrete implementations: a reqwest TMDb client with an SQLite
//! response cache, an SQLite favorites table, a JSON config file and an image
//! cache directory.

mod data;
pub mod local;
pub mod web;

pub use data::{
    page_after, Configuration, Genre, ImagesConfiguration, MovieData, MovieDetailsData,
    MoviePage, PagingEnvelope,
};
pub use local::{DiskImageCache, JsonConfigStore, SqliteFavoriteStore};
pub use web::{HttpCache, TmdbClient};

use crate::error::Result;
use async_trait::async_trait;
use moviebrowser_common::EntityId;
use std::collections::BTreeSet;

/// Remote movie catalog.
///
/// Paginated calls take the previously fetched page as a cursor: `None`
/// requests the first page, and a cursor that is already the last page
/// yields [`PagingEnvelope::empty`] without touching the network.
#[async_trait]
pub trait MovieDbService: Send + Sync {
    async fn configuration(&self) -> Result<Configuration>;

    /// Drop cached HTTP responses. Returns `false` if the cache could not
    /// be cleared.
    async fn clear_cache(&self) -> Result<bool>;

    async fn now_playing(&self, previous: Option<&MoviePage>) -> Result<MoviePage>;

    async fn movie_details(&self, id: EntityId) -> Result<MovieDetailsData>;

    async fn similar_movies(
        &self,
        id: EntityId,
        previous: Option<&MoviePage>,
    ) -> Result<MoviePage>;
}

/// Local persistence of the user's favorites.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// All favorites, most recently added first.
    async fn all_favorite_movies(&self) -> Result<Vec<MovieData>>;

    /// Insert or replace a favorite. Returns whether the row was written.
    async fn add_favorite_movie(&self, movie: &MovieData) -> Result<bool>;

    async fn favorite_movie(&self, id: EntityId) -> Result<Option<MovieData>>;

    /// Returns whether a row was removed.
    async fn delete_favorite_movie(&self, id: EntityId) -> Result<bool>;

    /// Remove every favorite.
    async fn clear_data(&self) -> Result<bool>;
}

/// Keys understood by [`ConfigStore`].
pub struct ConfigKeys;

impl ConfigKeys {
    pub const TMDB_IMAGE_BASE_URL: &'static str = "TMDB_IMAGE_BASE_URL";
    pub const TMDB_BACKDROP_SIZES: &'static str = "TMDB_BACKDROP_SIZES";
    pub const TMDB_POSTER_SIZES: &'static str = "TMDB_POSTER_SIZES";
}

/// Small persistent key/value settings store.
pub trait ConfigStore: Send + Sync {
    fn config_item(&self, key: &str) -> Option<String>;

    fn save_config_item(&self, key: &str, value: &str) -> Result<()>;

    fn config_set(&self, key: &str) -> Option<BTreeSet<String>>;

    fn save_config_set(&self, key: &str, values: &BTreeSet<String>) -> Result<()>;
}

/// On-disk image cache.
#[async_trait]
pub trait ImageCache: Send + Sync {
    async fn clear_disk_cache(&self) -> Result<()>;
}
