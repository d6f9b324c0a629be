//! Raw records exchanged with TMDb and local storage.
//!
//! Field names follow TMDb's snake_case JSON so the same types serve the
//! remote client and the favorites table's JSON column.

use moviebrowser_common::{Entity, EntityId};
use serde::{Deserialize, Serialize};

/// A movie as it appears in list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieData {
    pub id: EntityId,
    pub adult: bool,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genre_ids: Vec<i64>,
    pub video: bool,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
}

impl MovieData {
    /// Records without a positive id, a title or a poster are unusable.
    pub fn is_valid(&self) -> bool {
        self.id > 0 && self.title.is_some() && self.poster_path.is_some()
    }
}

impl Entity for MovieData {
    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Full record returned by `movie/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieDetailsData {
    #[serde(flatten)]
    pub movie: MovieData,
    pub tagline: Option<String>,
    pub runtime: Option<i64>,
    pub budget: i64,
    pub revenue: i64,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<Genre>,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingEnvelope<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> PagingEnvelope<T> {
    /// The "nothing more to fetch" page.
    pub fn empty() -> Self {
        Self {
            page: 0,
            total_pages: 0,
            total_results: 0,
            results: Vec::new(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page number to request after this one, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more().then(|| self.page + 1)
    }
}

/// Page number to request after `previous`; `None` when the listing is
/// exhausted. A missing cursor means the first page.
pub fn page_after<T>(previous: Option<&PagingEnvelope<T>>) -> Option<u32> {
    match previous {
        None => Some(1),
        Some(page) => page.next_page(),
    }
}

pub type MoviePage = PagingEnvelope<MovieData>;

/// Image section of the `configuration` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfiguration {
    pub base_url: Option<String>,
    pub secure_base_url: Option<String>,
    pub backdrop_sizes: Vec<String>,
    pub logo_sizes: Vec<String>,
    pub poster_sizes: Vec<String>,
    pub profile_sizes: Vec<String>,
    pub still_sizes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub images: Option<ImagesConfiguration>,
    pub change_keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_rule() {
        let valid = MovieData {
            id: 5,
            title: Some("X".into()),
            poster_path: Some("/a.jpg".into()),
            ..Default::default()
        };
        assert!(valid.is_valid());

        assert!(!MovieData { id: 0, ..valid.clone() }.is_valid());
        assert!(!MovieData { title: None, ..valid.clone() }.is_valid());
        assert!(!MovieData { poster_path: None, ..valid }.is_valid());
    }

    #[test]
    fn test_parse_now_playing_page() {
        let json = r#"{
            "page": 1,
            "total_pages": 34,
            "total_results": 670,
            "dates": {"maximum": "2024-05-01", "minimum": "2024-03-14"},
            "results": [
                {"id": 823464, "title": "Godzilla x Kong", "poster_path": "/z1p34vh7dEOnLDmyCrlUVLuoDzd.jpg",
                 "vote_average": 7.2, "genre_ids": [878, 28]},
                {"id": 0}
            ]
        }"#;

        let page: MoviePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.next_page(), Some(2));
        assert_eq!(page.results.len(), 2);
        assert!(page.results[0].is_valid());
        assert!(!page.results[1].is_valid());
    }

    #[test]
    fn test_details_flatten_movie_fields() {
        let json = r#"{"id": 550, "title": "Fight Club", "poster_path": "/p.jpg",
                       "tagline": "Mischief. Mayhem. Soap.", "runtime": 139,
                       "genres": [{"id": 18, "name": "Drama"}]}"#;

        let details: MovieDetailsData = serde_json::from_str(json).unwrap();
        assert_eq!(details.movie.id, 550);
        assert_eq!(details.tagline.as_deref(), Some("Mischief. Mayhem. Soap."));
        assert_eq!(details.genres[0].name, "Drama");
    }

    #[test]
    fn test_empty_envelope_has_no_more_pages() {
        let page = MoviePage::empty();
        assert!(!page.has_more());
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn test_page_after_cursor() {
        let last = MoviePage {
            page: 3,
            total_pages: 3,
            total_results: 60,
            results: Vec::new(),
        };
        let middle = MoviePage { page: 2, ..last.clone() };

        assert_eq!(page_after::<MovieData>(None), Some(1));
        assert_eq!(page_after(Some(&middle)), Some(3));
        assert_eq!(page_after(Some(&last)), None);
    }
}
