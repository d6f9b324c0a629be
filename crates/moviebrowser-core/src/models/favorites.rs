//! The user's favorite movies.

use super::{completed, Completion, EntityStore, Movie, MovieCollection, MovieCollectionObserver};
use crate::error::{MovieBrowserError, Result};
use crate::repository::{FavoriteStore, MovieData};
use futures::FutureExt;
use moviebrowser_common::{recover, CollectionAction, CollectionObservable, EntityId};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Default)]
struct FavoritesState {
    movies: Vec<Arc<Movie>>,
    /// Set once storage has been read; edits alone do not count.
    loaded: bool,
    load: Option<Completion>,
    refresh: Option<Completion>,
    tail: Option<Completion>,
}

impl FavoritesState {
    fn active(&self) -> Option<&Completion> {
        self.load.as_ref().or(self.refresh.as_ref())
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.movies.iter().position(|m| m.id() == id)
    }
}

struct FavoritesInner {
    favorite_store: Arc<dyn FavoriteStore>,
    entity_store: Arc<EntityStore>,
    state: Mutex<FavoritesState>,
    observable: CollectionObservable<dyn MovieCollection, Arc<Movie>>,
}

/// Favorites, newest first, backed by a [`FavoriteStore`].
///
/// A single page: the whole list is read from storage at once. Edits write to
/// storage first and only touch the in-memory list when storage agrees.
#[derive(Clone)]
pub struct FavoriteMovieCollection {
    inner: Arc<FavoritesInner>,
}

impl FavoriteMovieCollection {
    pub fn new(favorite_store: Arc<dyn FavoriteStore>, entity_store: Arc<EntityStore>) -> Self {
        Self {
            inner: Arc::new(FavoritesInner {
                favorite_store,
                entity_store,
                state: Mutex::new(FavoritesState::default()),
                observable: CollectionObservable::new(),
            }),
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        recover(self.inner.state.lock()).position(id).is_some()
    }

    /// Store `movie` as a favorite and put it at the front of the list.
    ///
    /// Fails with [`MovieBrowserError::InvalidArgument`] if the movie is
    /// already listed or flagged. Returns the store's answer.
    pub async fn add_to_favorite(&self, movie: &Arc<Movie>) -> Result<bool> {
        if self.contains(movie.id()) || movie.is_favorite() {
            return Err(MovieBrowserError::InvalidArgument(format!(
                "movie {} is already a favorite",
                movie.id()
            )));
        }

        let added = self
            .inner
            .favorite_store
            .add_favorite_movie(movie.data())
            .await?;
        if !added {
            debug!("Favorite store declined movie {}", movie.id());
            return Ok(false);
        }

        recover(self.inner.state.lock()).movies.insert(0, movie.clone());
        movie.set_favorite(true);
        info!("Added movie {} to favorites", movie.id());
        self.publish(CollectionAction::AddItemToFront, Some(movie), None);
        Ok(true)
    }

    /// Remove `movie` from storage and from the list.
    ///
    /// Fails with [`MovieBrowserError::InvalidArgument`] unless the movie is
    /// both listed and flagged.
    pub async fn remove_from_favorite(&self, movie: &Arc<Movie>) -> Result<bool> {
        if !self.contains(movie.id()) || !movie.is_favorite() {
            return Err(MovieBrowserError::InvalidArgument(format!(
                "movie {} is not a favorite",
                movie.id()
            )));
        }

        let removed = self
            .inner
            .favorite_store
            .delete_favorite_movie(movie.id())
            .await?;
        if !removed {
            debug!("Favorite store kept movie {}", movie.id());
            return Ok(false);
        }

        {
            let mut state = recover(self.inner.state.lock());
            if let Some(index) = state.position(movie.id()) {
                state.movies.remove(index);
            }
        }
        movie.set_favorite(false);
        info!("Removed movie {} from favorites", movie.id());
        self.publish(CollectionAction::RemoveItem, Some(movie), None);
        Ok(true)
    }

    /// Forget every favorite in memory. Storage is left alone.
    pub(crate) fn clear(&self) {
        let dropped = {
            let mut state = recover(self.inner.state.lock());
            state.loaded = false;
            std::mem::take(&mut state.movies)
        };
        for movie in &dropped {
            movie.set_favorite(false);
        }
        self.publish(CollectionAction::Clear, None, None);
    }

    fn publish(
        &self,
        action: CollectionAction,
        item: Option<&Arc<Movie>>,
        range: Option<&[Arc<Movie>]>,
    ) {
        let source: &dyn MovieCollection = self;
        self.inner.observable.publish(source, action, item, range);
    }

    fn request(&self, refresh: bool) -> Completion {
        let mut state = recover(self.inner.state.lock());
        let own = if refresh { &state.refresh } else { &state.load };
        if let Some(pending) = own {
            return pending.clone();
        }
        let busy = state.active().is_some();
        if !busy && !refresh && state.loaded {
            return completed();
        }
        let ahead = if busy { state.tail.clone() } else { None };

        let inner = Arc::downgrade(&self.inner);
        let handle = async move {
            if let Some(ahead) = ahead {
                let _ = ahead.await;
            }
            let Some(inner) = inner.upgrade() else {
                return Ok(());
            };
            if !refresh {
                let mut state = recover(inner.state.lock());
                if state.loaded {
                    state.load.take();
                    return Ok(());
                }
            }
            let fetched = inner.favorite_store.all_favorite_movies().await;
            let collection = Self { inner };
            collection.complete(refresh, fetched)
        }
        .boxed()
        .shared();

        if refresh {
            state.refresh = Some(handle.clone());
        } else {
            state.load = Some(handle.clone());
        }
        state.tail = Some(handle.clone());
        handle
    }

    fn complete(&self, refresh: bool, fetched: Result<Vec<MovieData>>) -> Result<()> {
        let mut state = recover(self.inner.state.lock());
        if refresh {
            state.refresh.take();
        } else {
            state.load.take();
        }
        let records = fetched?;
        state.loaded = true;

        let stale = if refresh {
            std::mem::take(&mut state.movies)
        } else {
            Vec::new()
        };

        let mut added = Vec::with_capacity(records.len());
        for data in records {
            if state.position(data.id).is_some() {
                continue;
            }
            let movie = self.inner.entity_store.movie_model(&data);
            state.movies.push(movie.clone());
            added.push(movie);
        }
        let dropped: Vec<Arc<Movie>> = stale
            .into_iter()
            .filter(|m| state.position(m.id()).is_none())
            .collect();
        drop(state);

        for movie in &dropped {
            movie.set_favorite(false);
        }
        if refresh {
            self.publish(CollectionAction::Clear, None, None);
        }
        debug!("Loaded {} favorites", added.len());
        for movie in &added {
            movie.set_favorite(true);
            self.publish(CollectionAction::AppendItem, Some(movie), None);
        }
        Ok(())
    }
}

impl MovieCollection for FavoriteMovieCollection {
    fn movies(&self) -> Vec<Arc<Movie>> {
        recover(self.inner.state.lock()).movies.clone()
    }

    fn len(&self) -> usize {
        recover(self.inner.state.lock()).movies.len()
    }

    fn is_loading(&self) -> bool {
        recover(self.inner.state.lock()).active().is_some()
    }

    fn load(&self) -> Completion {
        self.request(false)
    }

    fn refresh(&self) -> Completion {
        self.request(true)
    }

    fn has_next_page(&self) -> bool {
        false
    }

    fn load_next_page(&self) -> Completion {
        completed()
    }

    fn add_observer(&self, observer: &Arc<MovieCollectionObserver>) {
        self.inner.observable.add_observer(observer);
    }

    fn delete_observer(&self, observer: &Arc<MovieCollectionObserver>) {
        self.inner.observable.delete_observer(observer);
    }

    fn delete_observers(&self) {
        self.inner.observable.delete_observers();
    }
}

impl fmt::Debug for FavoriteMovieCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = recover(self.inner.state.lock());
        f.debug_struct("FavoriteMovieCollection")
            .field("movies", &state.movies.len())
            .field("is_loading", &state.active().is_some())
            .finish()
    }
}
