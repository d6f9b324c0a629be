use super::{Completion, EntityStore, SimilarMovieCollection};
use crate::repository::{MovieData, MovieDbService, MovieDetailsData};
use futures::FutureExt;
use moviebrowser_common::{recover, EntityId, ObjectObservable, ObjectObserver};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Extra information loaded on demand from `movie/{id}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Details {
    pub tagline: Option<String>,
    pub runtime: Option<i64>,
    pub genres: Vec<String>,
    pub homepage: Option<String>,
    pub status: Option<String>,
    pub imdb_id: Option<String>,
}

impl From<&MovieDetailsData> for Details {
    fn from(data: &MovieDetailsData) -> Self {
        Self {
            tagline: data.tagline.clone().filter(|t| !t.is_empty()),
            runtime: data.runtime,
            genres: data.genres.iter().map(|g| g.name.clone()).collect(),
            homepage: data.homepage.clone().filter(|h| !h.is_empty()),
            status: data.status.clone(),
            imdb_id: data.imdb_id.clone(),
        }
    }
}

/// The canonical in-memory representation of one movie.
///
/// Obtain instances through [`EntityStore::movie_model`]; there is at most one
/// live `Movie` per id. Observers registered with [`Movie::add_observer`] are
/// told whenever the favorite flag flips or details arrive.
pub struct Movie {
    data: MovieData,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    is_favorite: AtomicBool,
    details: RwLock<Option<Details>>,
    details_request: Mutex<Option<Completion>>,
    similar_movies: Mutex<Option<SimilarMovieCollection>>,
    movie_db: Arc<dyn MovieDbService>,
    entity_store: Arc<EntityStore>,
    observable: ObjectObservable<Movie>,
}

impl Movie {
    pub(crate) fn new(
        movie_db: Arc<dyn MovieDbService>,
        entity_store: Arc<EntityStore>,
        data: &MovieData,
    ) -> Self {
        debug_assert!(
            entity_store.find_movie_by_id(data.id).is_none(),
            "movie {} constructed twice; go through EntityStore::movie_model",
            data.id
        );

        Self {
            poster_path: normalize_image_path(data.poster_path.as_deref()),
            backdrop_path: normalize_image_path(data.backdrop_path.as_deref()),
            data: data.clone(),
            is_favorite: AtomicBool::new(false),
            details: RwLock::new(None),
            details_request: Mutex::new(None),
            similar_movies: Mutex::new(None),
            movie_db,
            entity_store,
            observable: ObjectObservable::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.data.id
    }

    pub fn title(&self) -> &str {
        self.data.title.as_deref().unwrap_or_default()
    }

    pub fn overview(&self) -> Option<&str> {
        self.data.overview.as_deref()
    }

    pub fn release_date(&self) -> Option<&str> {
        self.data.release_date.as_deref()
    }

    /// Poster path relative to the image base URL, without a leading `/`.
    pub fn poster_path(&self) -> Option<&str> {
        self.poster_path.as_deref()
    }

    /// Backdrop path relative to the image base URL, without a leading `/`.
    pub fn backdrop_path(&self) -> Option<&str> {
        self.backdrop_path.as_deref()
    }

    /// TMDb vote average on its native 0 to 10 scale.
    pub fn vote_average(&self) -> f64 {
        self.data.vote_average
    }

    /// Vote average rescaled to a 0 to 5 star rating.
    pub fn rating(&self) -> f32 {
        (self.data.vote_average / 2.0) as f32
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite.load(Ordering::SeqCst)
    }

    /// Flip the favorite flag. Observers hear about real changes only.
    pub(crate) fn set_favorite(&self, favorite: bool) {
        let previous = self.is_favorite.swap(favorite, Ordering::SeqCst);
        if previous != favorite {
            self.observable.publish(self, None);
        }
    }

    pub fn details(&self) -> Option<Details> {
        recover(self.details.read()).clone()
    }

    /// The raw record this movie was built from.
    pub fn data(&self) -> &MovieData {
        &self.data
    }

    pub fn is_loading_details(&self) -> bool {
        recover(self.details_request.lock()).is_some()
    }

    /// Fetch details from the remote catalog.
    ///
    /// Calls made while a fetch is pending share its handle.
    pub fn load_details(self: &Arc<Self>) -> Completion {
        let mut request = recover(self.details_request.lock());
        if let Some(pending) = request.as_ref() {
            return pending.clone();
        }

        let movie = Arc::downgrade(self);
        let handle = async move {
            let Some(movie) = movie.upgrade() else {
                return Ok(());
            };
            let fetched = movie.movie_db.movie_details(movie.id()).await;
            recover(movie.details_request.lock()).take();

            let details = fetched?;
            movie.apply_details(&details);
            Ok(())
        }
        .boxed()
        .shared();

        *request = Some(handle.clone());
        handle
    }

    pub(crate) fn apply_details(&self, details: &MovieDetailsData) {
        *recover(self.details.write()) = Some(Details::from(details));
        debug!("Loaded details for movie {}", self.id());
        self.observable.publish(self, None);
    }

    /// Movies similar to this one, created on first use.
    pub fn similar_movies(&self) -> SimilarMovieCollection {
        recover(self.similar_movies.lock())
            .get_or_insert_with(|| {
                SimilarMovieCollection::similar_to(
                    self.id(),
                    self.movie_db.clone(),
                    self.entity_store.clone(),
                )
            })
            .clone()
    }

    /// Drop the owned similar-movies list.
    ///
    /// Two movies that appear in each other's similar lists keep each other
    /// alive; releasing the list breaks that cycle.
    pub fn release_similar_movies(&self) {
        recover(self.similar_movies.lock()).take();
    }

    pub fn add_observer(&self, observer: &Arc<dyn ObjectObserver<Movie>>) {
        self.observable.add_observer(observer);
    }

    pub fn delete_observer(&self, observer: &Arc<dyn ObjectObserver<Movie>>) {
        self.observable.delete_observer(observer);
    }
}

impl fmt::Debug for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Movie")
            .field("id", &self.id())
            .field("title", &self.title())
            .field("is_favorite", &self.is_favorite())
            .finish_non_exhaustive()
    }
}

fn normalize_image_path(path: Option<&str>) -> Option<String> {
    let path = path?;
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
