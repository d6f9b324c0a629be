use super::Movie;
use crate::repository::{MovieData, MovieDbService};
use moviebrowser_common::{EntityId, ModelObjectStore};
use std::fmt;
use std::sync::{Arc, Weak};

/// Hands out the canonical [`Movie`] for each movie id.
///
/// Movies hold the store strongly (their similar-movies lists need it); the
/// store only holds movies weakly, so there is no ownership cycle.
pub struct EntityStore {
    movies: ModelObjectStore<Movie, MovieData>,
}

impl EntityStore {
    pub fn new(movie_db: Arc<dyn MovieDbService>) -> Arc<Self> {
        Arc::new_cyclic(|store: &Weak<EntityStore>| {
            let store = store.clone();
            Self {
                movies: ModelObjectStore::new(move |data: &MovieData| {
                    // Only reachable through `&self` of a live Arc.
                    let store = store
                        .upgrade()
                        .expect("entity store is alive while it creates movies");
                    Movie::new(movie_db.clone(), store, data)
                }),
            }
        })
    }

    /// Canonical movie for `data`, created on first sight.
    pub fn movie_model(&self, data: &MovieData) -> Arc<Movie> {
        self.movies.get_or_create(data)
    }

    pub fn find_movie_by_id(&self, id: EntityId) -> Option<Arc<Movie>> {
        self.movies.find(id)
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("movies", &self.movies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie_data, FakeMovieDb};

    #[test]
    fn test_same_id_same_movie() {
        let store = EntityStore::new(Arc::new(FakeMovieDb::default()));
        let first = store.movie_model(&movie_data(100, "Star Wars"));
        let second = store.movie_model(&movie_data(100, "Star Wars: Episode IV"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.title(), "Star Wars");
    }

    #[test]
    fn test_dropped_movie_is_forgotten() {
        let store = EntityStore::new(Arc::new(FakeMovieDb::default()));
        let movie = store.movie_model(&movie_data(7, "Se7en"));
        assert!(store.find_movie_by_id(7).is_some());

        drop(movie);
        assert!(store.find_movie_by_id(7).is_none());

        let again = store.movie_model(&movie_data(7, "Seven"));
        assert_eq!(again.title(), "Seven");
    }
}
