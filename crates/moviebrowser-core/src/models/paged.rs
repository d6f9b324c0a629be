//! Cursor-paginated movie lists.

use super::{completed, Completion, EntityStore, Movie, MovieCollection, MovieCollectionObserver};
use crate::error::Result;
use crate::repository::{MovieDbService, MoviePage};
use async_trait::async_trait;
use futures::FutureExt;
use moviebrowser_common::{recover, CollectionAction, CollectionObservable, EntityId};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Where a [`PagedMovieCollection`] gets its pages from.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn first_page(&self) -> Result<MoviePage>;

    /// Page following `previous`, or [`MoviePage::empty`] past the end.
    async fn next_page(&self, previous: &MoviePage) -> Result<MoviePage>;
}

/// The global "now playing" listing.
pub struct NowPlayingSource {
    movie_db: Arc<dyn MovieDbService>,
}

impl NowPlayingSource {
    pub fn new(movie_db: Arc<dyn MovieDbService>) -> Self {
        Self { movie_db }
    }
}

#[async_trait]
impl PageSource for NowPlayingSource {
    async fn first_page(&self) -> Result<MoviePage> {
        self.movie_db.now_playing(None).await
    }

    async fn next_page(&self, previous: &MoviePage) -> Result<MoviePage> {
        self.movie_db.now_playing(Some(previous)).await
    }
}

/// Movies similar to one movie.
pub struct SimilarMoviesSource {
    movie_id: EntityId,
    movie_db: Arc<dyn MovieDbService>,
}

impl SimilarMoviesSource {
    pub fn new(movie_id: EntityId, movie_db: Arc<dyn MovieDbService>) -> Self {
        Self { movie_id, movie_db }
    }

    pub fn movie_id(&self) -> EntityId {
        self.movie_id
    }
}

#[async_trait]
impl PageSource for SimilarMoviesSource {
    async fn first_page(&self) -> Result<MoviePage> {
        self.movie_db.similar_movies(self.movie_id, None).await
    }

    async fn next_page(&self, previous: &MoviePage) -> Result<MoviePage> {
        self.movie_db
            .similar_movies(self.movie_id, Some(previous))
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Load,
    Refresh,
    NextPage,
}

#[derive(Default)]
struct PagedState {
    /// Envelopes fetched so far, with their records moved out.
    pages: Vec<MoviePage>,
    movies: Vec<Arc<Movie>>,
    load: Option<Completion>,
    refresh: Option<Completion>,
    next_page: Option<Completion>,
    /// Most recently issued handle; later requests of another kind queue behind it.
    tail: Option<Completion>,
}

impl PagedState {
    fn slot(&mut self, operation: Operation) -> &mut Option<Completion> {
        match operation {
            Operation::Load => &mut self.load,
            Operation::Refresh => &mut self.refresh,
            Operation::NextPage => &mut self.next_page,
        }
    }

    fn active(&self) -> Option<&Completion> {
        self.load
            .as_ref()
            .or(self.refresh.as_ref())
            .or(self.next_page.as_ref())
    }

    fn has_next_page(&self) -> bool {
        self.pages.last().map_or(true, MoviePage::has_more)
    }

    /// True when `operation` has nothing left to fetch.
    fn settled(&self, operation: Operation) -> bool {
        match operation {
            Operation::Load => !self.movies.is_empty(),
            Operation::NextPage => !self.has_next_page(),
            Operation::Refresh => false,
        }
    }

    fn contains(&self, id: EntityId) -> bool {
        self.movies.iter().any(|m| m.id() == id)
    }
}

struct PagedInner<S> {
    source: S,
    entity_store: Arc<EntityStore>,
    state: Mutex<PagedState>,
    observable: CollectionObservable<dyn MovieCollection, Arc<Movie>>,
}

/// An incrementally fetched, duplicate-free list of canonical movies.
///
/// Cloning is cheap and every clone observes the same list.
pub struct PagedMovieCollection<S: PageSource> {
    inner: Arc<PagedInner<S>>,
}

pub type NowPlayingCollection = PagedMovieCollection<NowPlayingSource>;

pub type SimilarMovieCollection = PagedMovieCollection<SimilarMoviesSource>;

impl<S: PageSource> PagedMovieCollection<S> {
    pub fn new(source: S, entity_store: Arc<EntityStore>) -> Self {
        Self {
            inner: Arc::new(PagedInner {
                source,
                entity_store,
                state: Mutex::new(PagedState::default()),
                observable: CollectionObservable::new(),
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Number of pages fetched so far.
    pub fn page_count(&self) -> usize {
        recover(self.inner.state.lock()).pages.len()
    }

    fn request(&self, operation: Operation) -> Completion {
        let mut state = recover(self.inner.state.lock());
        if let Some(pending) = state.slot(operation).as_ref() {
            return pending.clone();
        }
        // One fetch at a time: another kind in flight runs first.
        let busy = state.active().is_some();
        if !busy && state.settled(operation) {
            return completed();
        }
        let ahead = if busy { state.tail.clone() } else { None };

        let inner = Arc::downgrade(&self.inner);
        let handle = async move {
            if let Some(ahead) = ahead {
                // Its outcome is reported to its own callers.
                let _ = ahead.await;
            }
            let Some(inner) = inner.upgrade() else {
                return Ok(());
            };
            let previous = {
                let mut state = recover(inner.state.lock());
                if state.settled(operation) {
                    state.slot(operation).take();
                    return Ok(());
                }
                match operation {
                    Operation::NextPage => state.pages.last().cloned(),
                    Operation::Load | Operation::Refresh => None,
                }
            };
            let fetched = match previous.as_ref() {
                Some(previous) => inner.source.next_page(previous).await,
                None => inner.source.first_page().await,
            };
            Self::complete(&inner, operation, fetched)
        }
        .boxed()
        .shared();

        *state.slot(operation) = Some(handle.clone());
        state.tail = Some(handle.clone());
        handle
    }

    fn complete(
        inner: &Arc<PagedInner<S>>,
        operation: Operation,
        fetched: Result<MoviePage>,
    ) -> Result<()> {
        let mut state = recover(inner.state.lock());
        state.slot(operation).take();
        let mut page = fetched?;

        let refreshed = operation == Operation::Refresh;
        // Held until the lock is released so reused ids keep their instance.
        let stale = if refreshed {
            state.pages.clear();
            std::mem::take(&mut state.movies)
        } else {
            Vec::new()
        };

        let records = std::mem::take(&mut page.results);
        let page_number = page.page;
        state.pages.push(page);

        let mut added: Vec<Arc<Movie>> = Vec::with_capacity(records.len());
        for data in records {
            if !data.is_valid() {
                if cfg!(debug_assertions) {
                    warn!("Dropping invalid movie record {} on page {}", data.id, page_number);
                }
                continue;
            }
            if state.contains(data.id) || added.iter().any(|m| m.id() == data.id) {
                continue;
            }
            added.push(inner.entity_store.movie_model(&data));
        }
        state.movies.extend(added.iter().cloned());
        drop(state);
        drop(stale);

        let collection = Self {
            inner: inner.clone(),
        };
        let source: &dyn MovieCollection = &collection;
        if refreshed {
            inner
                .observable
                .publish(source, CollectionAction::Clear, None, None);
        }
        if added.is_empty() {
            debug!("Page {} added no new movies", page_number);
        } else {
            inner
                .observable
                .publish(source, CollectionAction::AppendRange, None, Some(&added));
        }
        Ok(())
    }
}

impl NowPlayingCollection {
    pub fn now_playing(movie_db: Arc<dyn MovieDbService>, entity_store: Arc<EntityStore>) -> Self {
        Self::new(NowPlayingSource::new(movie_db), entity_store)
    }
}

impl SimilarMovieCollection {
    pub fn similar_to(
        movie_id: EntityId,
        movie_db: Arc<dyn MovieDbService>,
        entity_store: Arc<EntityStore>,
    ) -> Self {
        Self::new(SimilarMoviesSource::new(movie_id, movie_db), entity_store)
    }

    /// Id of the movie this list belongs to.
    pub fn movie_id(&self) -> EntityId {
        self.inner.source.movie_id()
    }
}

impl<S: PageSource> Clone for PagedMovieCollection<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: PageSource> MovieCollection for PagedMovieCollection<S> {
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
        self.request(Operation::Load)
    }

    fn refresh(&self) -> Completion {
        self.request(Operation::Refresh)
    }

    fn has_next_page(&self) -> bool {
        recover(self.inner.state.lock()).has_next_page()
    }

    fn load_next_page(&self) -> Completion {
        self.request(Operation::NextPage)
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

impl<S: PageSource> fmt::Debug for PagedMovieCollection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = recover(self.inner.state.lock());
        f.debug_struct("PagedMovieCollection")
            .field("movies", &state.movies.len())
            .field("pages", &state.pages.len())
            .field("is_loading", &state.active().is_some())
            .finish()
    }
}
