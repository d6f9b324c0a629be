//! Movie lookup, favorites and data-cleaning methods for MovieBrowser.

use crate::error::{MovieBrowserError, Result};
use crate::models::{CleaningStage, DataCleaner, Movie};
use crate::MovieBrowser;
use futures::stream::BoxStream;
use moviebrowser_common::EntityId;
use std::sync::Arc;

impl MovieBrowser {
    /// Canonical movie for `id`.
    ///
    /// A live instance is returned as is; otherwise the movie is fetched from
    /// TMDb together with its details.
    pub async fn movie(&self, id: EntityId) -> Result<Arc<Movie>> {
        if id <= 0 {
            return Err(MovieBrowserError::InvalidArgument(format!(
                "invalid movie id {}",
                id
            )));
        }
        if let Some(movie) = self.entity_store.find_movie_by_id(id) {
            return Ok(movie);
        }

        let details = self.movie_db.movie_details(id).await?;
        if !details.movie.is_valid() {
            return Err(MovieBrowserError::MovieNotFound { id });
        }
        let movie = self.entity_store.movie_model(&details.movie);
        if movie.details().is_none() {
            movie.apply_details(&details);
        }
        Ok(movie)
    }

    /// Add `movie` to favorites, or remove it if it already is one.
    ///
    /// Returns the new favorite state.
    pub async fn toggle_favorite(&self, movie: &Arc<Movie>) -> Result<bool> {
        if movie.is_favorite() {
            self.favorites.remove_from_favorite(movie).await?;
        } else {
            self.favorites.add_to_favorite(movie).await?;
        }
        Ok(movie.is_favorite())
    }

    pub fn data_cleaner(&self) -> DataCleaner {
        DataCleaner::new(
            self.favorites.clone(),
            self.favorite_store.clone(),
            self.movie_db.clone(),
            self.image_cache.clone(),
        )
    }

    /// Clear cached data, and favorites too if asked. See
    /// [`DataCleaner::clear_data`].
    pub fn clear_data(&self, clear_favorites: bool) -> BoxStream<'static, Result<CleaningStage>> {
        self.data_cleaner().clear_data(clear_favorites)
    }
}
