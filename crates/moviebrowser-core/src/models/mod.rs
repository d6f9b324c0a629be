//! In-memory object graph over the repository layer.
//!
//! Every movie is represented by exactly one live [`Movie`] per id, handed
//! out by the [`EntityStore`]. Lists of movies implement [`MovieCollection`]
//! and notify [`CollectionObserver`]s of fine-grained changes.
//!
//! # Handles
//!
//! Loading operations return a [`Completion`]: a lazy, cloneable future.
//! Nothing is fetched until some clone of the handle is awaited. Repeating a
//! request while it is in flight returns a clone of the same handle. A request
//! of another kind gets its own handle, which runs after the pending one, so
//! fetches never overlap and no request is dropped.
//!
//! # Concurrency
//!
//! All types are `Send + Sync` and internal state is lock-protected, but the
//! locks only guard against data races. Callers must drive each collection
//! from one logical lane: interleaving `load`, `refresh` and favorite edits
//! from parallel tasks is not ordered by this layer.

mod cleaner;
mod entity_store;
mod favorites;
mod image_config;
mod movie;
mod paged;

pub use cleaner::{CleaningStage, DataCleaner};
pub use entity_store::EntityStore;
pub use favorites::FavoriteMovieCollection;
pub use image_config::{ImageConfig, ImageSizesConfig, TmdbConfig};
pub use movie::{Details, Movie};
pub use paged::{
    NowPlayingCollection, NowPlayingSource, PageSource, PagedMovieCollection,
    SimilarMovieCollection, SimilarMoviesSource,
};

pub use moviebrowser_common::{CollectionAction, CollectionObserver, ObjectObserver};

use crate::error::Result;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::sync::Arc;

/// Shared handle to an in-flight (or finished) operation.
pub type Completion = Shared<BoxFuture<'static, Result<()>>>;

/// Observer of any movie list.
pub type MovieCollectionObserver = dyn CollectionObserver<dyn MovieCollection, Arc<Movie>>;

pub(crate) fn completed() -> Completion {
    future::ready(Ok(())).boxed().shared()
}

/// An observable, incrementally loaded list of canonical movies.
pub trait MovieCollection: Send + Sync {
    /// Snapshot of the current contents, in display order.
    fn movies(&self) -> Vec<Arc<Movie>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A collection counts as loaded once it holds at least one movie.
    fn is_loaded(&self) -> bool {
        !self.is_empty()
    }

    fn is_loading(&self) -> bool;

    /// Fetch the first page unless the collection is already loaded.
    fn load(&self) -> Completion;

    /// Re-fetch the first page and replace the contents.
    fn refresh(&self) -> Completion;

    fn has_next_page(&self) -> bool;

    /// Fetch the page after the last one loaded. Succeeds without fetching
    /// once the listing is exhausted.
    fn load_next_page(&self) -> Completion;

    fn add_observer(&self, observer: &Arc<MovieCollectionObserver>);

    fn delete_observer(&self, observer: &Arc<MovieCollectionObserver>);

    fn delete_observers(&self);
}
