//! In-memory collaborators for unit tests.

use crate::error::{MovieBrowserError, Result};
use crate::models::{Movie, MovieCollection};
use crate::repository::{
    page_after, ConfigStore, Configuration, FavoriteStore, ImageCache, MovieData,
    MovieDbService, MovieDetailsData, MoviePage,
};
use async_trait::async_trait;
use moviebrowser_common::{recover, CollectionAction, CollectionObserver, EntityId, ObjectObserver};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A record that passes validation.
pub(crate) fn movie_data(id: EntityId, title: &str) -> MovieData {
    MovieData {
        id,
        title: Some(title.to_string()),
        original_title: Some(title.to_string()),
        poster_path: Some(format!("/{}.jpg", id)),
        vote_average: 7.0,
        ..Default::default()
    }
}

pub(crate) fn page(number: u32, total_pages: u32, results: Vec<MovieData>) -> MoviePage {
    MoviePage {
        page: number,
        total_pages,
        total_results: results.len() as u64,
        results,
    }
}

fn offline() -> MovieBrowserError {
    MovieBrowserError::Network {
        message: "offline".into(),
        cause: None,
    }
}

fn serve(pages: &[MoviePage], previous: Option<&MoviePage>) -> MoviePage {
    page_after(previous)
        .and_then(|n| pages.get(n as usize - 1).cloned())
        .unwrap_or_else(MoviePage::empty)
}

/// Scriptable [`MovieDbService`].
pub(crate) struct FakeMovieDb {
    now_playing: Mutex<Vec<MoviePage>>,
    similar: Mutex<HashMap<EntityId, Vec<MoviePage>>>,
    details: Mutex<HashMap<EntityId, MovieDetailsData>>,
    configuration: Mutex<Option<Configuration>>,
    fail_pages: AtomicBool,
    clear_cache_result: AtomicBool,
    now_playing_calls: AtomicUsize,
    similar_calls: AtomicUsize,
    details_calls: AtomicUsize,
    clear_cache_calls: AtomicUsize,
}

impl Default for FakeMovieDb {
    fn default() -> Self {
        Self {
            now_playing: Mutex::default(),
            similar: Mutex::default(),
            details: Mutex::default(),
            configuration: Mutex::default(),
            fail_pages: AtomicBool::new(false),
            clear_cache_result: AtomicBool::new(true),
            now_playing_calls: AtomicUsize::new(0),
            similar_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
            clear_cache_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeMovieDb {
    pub(crate) fn set_now_playing(&self, pages: Vec<MoviePage>) {
        *recover(self.now_playing.lock()) = pages;
    }

    pub(crate) fn set_similar_pages(&self, id: EntityId, pages: Vec<MoviePage>) {
        recover(self.similar.lock()).insert(id, pages);
    }

    pub(crate) fn set_details(&self, details: MovieDetailsData) {
        recover(self.details.lock()).insert(details.movie.id, details);
    }

    pub(crate) fn set_configuration(&self, configuration: Configuration) {
        *recover(self.configuration.lock()) = Some(configuration);
    }

    pub(crate) fn fail_pages(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_clear_cache_result(&self, result: bool) {
        self.clear_cache_result.store(result, Ordering::SeqCst);
    }

    pub(crate) fn now_playing_calls(&self) -> usize {
        self.now_playing_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn clear_cache_calls(&self) -> usize {
        self.clear_cache_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MovieDbService for FakeMovieDb {
    async fn configuration(&self) -> Result<Configuration> {
        recover(self.configuration.lock()).clone().ok_or_else(offline)
    }

    async fn clear_cache(&self) -> Result<bool> {
        self.clear_cache_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.clear_cache_result.load(Ordering::SeqCst))
    }

    async fn now_playing(&self, previous: Option<&MoviePage>) -> Result<MoviePage> {
        self.now_playing_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(serve(&recover(self.now_playing.lock()), previous))
    }

    async fn movie_details(&self, id: EntityId) -> Result<MovieDetailsData> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        recover(self.details.lock())
            .get(&id)
            .cloned()
            .ok_or(MovieBrowserError::MovieNotFound { id })
    }

    async fn similar_movies(
        &self,
        id: EntityId,
        previous: Option<&MoviePage>,
    ) -> Result<MoviePage> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(offline());
        }
        let similar = recover(self.similar.lock());
        Ok(similar
            .get(&id)
            .map(|pages| serve(pages, previous))
            .unwrap_or_else(MoviePage::empty))
    }
}

/// [`FavoriteStore`] over a `Vec`, newest first.
#[derive(Default)]
pub(crate) struct MemoryFavoriteStore {
    movies: Mutex<Vec<MovieData>>,
    reject_writes: AtomicBool,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
    clear_calls: AtomicUsize,
    clear_error: Mutex<Option<MovieBrowserError>>,
}

impl MemoryFavoriteStore {
    pub(crate) fn seed(&self, movies: Vec<MovieData>) {
        *recover(self.movies.lock()) = movies;
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        recover(self.movies.lock()).iter().any(|m| m.id == id)
    }

    pub(crate) fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    /// Make `clear_data` fail with `err`.
    pub(crate) fn fail_clear(&self, err: MovieBrowserError) {
        *recover(self.clear_error.lock()) = Some(err);
    }
}

#[async_trait]
impl FavoriteStore for MemoryFavoriteStore {
    async fn all_favorite_movies(&self) -> Result<Vec<MovieData>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(recover(self.movies.lock()).clone())
    }

    async fn add_favorite_movie(&self, movie: &MovieData) -> Result<bool> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut movies = recover(self.movies.lock());
        movies.retain(|m| m.id != movie.id);
        movies.insert(0, movie.clone());
        Ok(true)
    }

    async fn favorite_movie(&self, id: EntityId) -> Result<Option<MovieData>> {
        Ok(recover(self.movies.lock()).iter().find(|m| m.id == id).cloned())
    }

    async fn delete_favorite_movie(&self, id: EntityId) -> Result<bool> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut movies = recover(self.movies.lock());
        let before = movies.len();
        movies.retain(|m| m.id != id);
        Ok(movies.len() != before)
    }

    async fn clear_data(&self) -> Result<bool> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = recover(self.clear_error.lock()).clone() {
            return Err(err);
        }
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        recover(self.movies.lock()).clear();
        Ok(true)
    }
}

#[derive(Default)]
pub(crate) struct MemoryConfigStore {
    items: Mutex<BTreeMap<String, String>>,
    sets: Mutex<BTreeMap<String, BTreeSet<String>>>,
    saves: AtomicUsize,
}

impl MemoryConfigStore {
    pub(crate) fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn config_item(&self, key: &str) -> Option<String> {
        recover(self.items.lock()).get(key).cloned()
    }

    fn save_config_item(&self, key: &str, value: &str) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        recover(self.items.lock()).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn config_set(&self, key: &str) -> Option<BTreeSet<String>> {
        recover(self.sets.lock()).get(key).cloned()
    }

    fn save_config_set(&self, key: &str, values: &BTreeSet<String>) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        recover(self.sets.lock()).insert(key.to_string(), values.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeImageCache {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeImageCache {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageCache for FakeImageCache {
    async fn clear_disk_cache(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MovieBrowserError::Io {
                message: "disk is read-only".into(),
                path: None,
                source: None,
            });
        }
        Ok(())
    }
}

/// One delivered collection notification, reduced to ids.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Event {
    pub action: CollectionAction,
    pub item: Option<EntityId>,
    pub range: Vec<EntityId>,
    pub source_len: usize,
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<Event> {
        recover(self.events.lock()).clone()
    }
}

impl CollectionObserver<dyn MovieCollection, Arc<Movie>> for RecordingObserver {
    fn on_update(
        &self,
        source: &dyn MovieCollection,
        action: CollectionAction,
        item: Option<&Arc<Movie>>,
        range: Option<&[Arc<Movie>]>,
    ) {
        recover(self.events.lock()).push(Event {
            action,
            item: item.map(|m| m.id()),
            range: range
                .map(|r| r.iter().map(|m| m.id()).collect())
                .unwrap_or_default(),
            source_len: source.len(),
        });
    }
}

#[derive(Default)]
pub(crate) struct MovieObserverCounter {
    count: AtomicUsize,
}

impl MovieObserverCounter {
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ObjectObserver<Movie> for MovieObserverCounter {
    fn on_update(&self, _source: &Movie, _data: Option<&(dyn Any + Send + Sync)>) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
