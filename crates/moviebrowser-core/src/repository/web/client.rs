//! TMDb v3 REST client.
//!
//! Provides the [`MovieDbService`] implementation used in production:
//! - `api_key` query authentication on every request
//! - Connect and request timeouts from [`NetworkConfig`]
//! - Optional response caching through [`HttpCache`]
//! - Paging by previous-envelope cursor

use super::HttpCache;
use crate::config::{AppConfig, NetworkConfig};
use crate::error::{MovieBrowserError, Result};
use crate::repository::{
    page_after, Configuration, MovieDbService, MovieDetailsData, MoviePage, PagingEnvelope,
};
use async_trait::async_trait;
use moviebrowser_common::EntityId;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Error body TMDb returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    status_message: Option<String>,
}

/// HTTP client for the TMDb API.
pub struct TmdbClient {
    client: Client,
    base_url: Url,
    api_key: String,
    cache: Option<Arc<HttpCache>>,
}

impl TmdbClient {
    /// Create a client against the public TMDb endpoint.
    pub fn new(api_key: impl Into<String>, cache: Option<Arc<HttpCache>>) -> Result<Self> {
        Self::with_base_url(NetworkConfig::TMDB_API_BASE, api_key, cache)
    }

    /// Create a client against a custom endpoint (proxies, test servers).
    pub fn with_base_url(
        base_url: &str,
        api_key: impl Into<String>,
        cache: Option<Arc<HttpCache>>,
    ) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| MovieBrowserError::Config {
            message: format!("Invalid TMDb base URL {}: {}", normalized, e),
        })?;

        let client = Client::builder()
            .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| MovieBrowserError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            cache,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of an endpoint without credentials. Doubles as the cache key.
    fn endpoint_url(&self, path: &str, page: Option<u32>) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| MovieBrowserError::Config {
                message: format!("Invalid endpoint path {}: {}", path, e),
            })?;
        if let Some(page) = page {
            url.query_pairs_mut()
                .append_pair(NetworkConfig::QUERY_PAGE, &page.to_string());
        }
        Ok(url)
    }

    async fn cached_body(&self, key: &str) -> Option<Vec<u8>> {
        let cache = self.cache.clone()?;
        let key = key.to_string();
        match tokio::task::spawn_blocking(move || cache.get(&key)).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                warn!("HTTP cache lookup failed: {}", e);
                None
            }
            Err(e) => {
                warn!("HTTP cache lookup task failed: {}", e);
                None
            }
        }
    }

    async fn store_body(&self, key: String, body: Vec<u8>) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        match tokio::task::spawn_blocking(move || cache.put(&key, &body)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to cache HTTP response: {}", e),
            Err(e) => warn!("HTTP cache write task failed: {}", e),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, page: Option<u32>) -> Result<T> {
        let url = self.endpoint_url(path, page)?;
        let cache_key = url.to_string();

        if let Some(body) = self.cached_body(&cache_key).await {
            match serde_json::from_slice(&body) {
                Ok(value) => {
                    debug!("HTTP cache hit for {}", cache_key);
                    return Ok(value);
                }
                Err(e) => warn!("Discarding unreadable cached response for {}: {}", cache_key, e),
            }
        }

        let mut request_url = url;
        request_url
            .query_pairs_mut()
            .append_pair(NetworkConfig::QUERY_API_KEY, &self.api_key);

        debug!("GET {}", cache_key);
        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(|e| request_error(&cache_key, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(&cache_key, e))?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let value = serde_json::from_slice(&body).map_err(|e| MovieBrowserError::Json {
            message: format!("Failed to parse response from {}: {}", cache_key, e),
            source: Some(Arc::new(e)),
        })?;

        self.store_body(cache_key, body.to_vec()).await;
        Ok(value)
    }

    async fn get_page(&self, path: &str, previous: Option<&MoviePage>) -> Result<MoviePage> {
        match page_after(previous) {
            Some(page) => self.get_json(path, Some(page)).await,
            None => Ok(PagingEnvelope::empty()),
        }
    }
}

#[async_trait]
impl MovieDbService for TmdbClient {
    async fn configuration(&self) -> Result<Configuration> {
        self.get_json("configuration", None).await
    }

    async fn clear_cache(&self) -> Result<bool> {
        let Some(cache) = self.cache.clone() else {
            return Ok(true);
        };
        let cleared = tokio::task::spawn_blocking(move || cache.clear_all()).await?;
        match cleared {
            Ok(count) => {
                debug!("Cleared {} cached TMDb responses", count);
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to clear HTTP cache: {}", e);
                Ok(false)
            }
        }
    }

    async fn now_playing(&self, previous: Option<&MoviePage>) -> Result<MoviePage> {
        self.get_page("movie/now_playing", previous).await
    }

    async fn movie_details(&self, id: EntityId) -> Result<MovieDetailsData> {
        self.get_json(&format!("movie/{}", id), None)
            .await
            .map_err(|e| match e {
                MovieBrowserError::Api {
                    status_code: 404, ..
                } => MovieBrowserError::MovieNotFound { id },
                other => other,
            })
    }

    async fn similar_movies(
        &self,
        id: EntityId,
        previous: Option<&MoviePage>,
    ) -> Result<MoviePage> {
        self.get_page(&format!("movie/{}/similar", id), previous)
            .await
    }
}

// Reqwest errors embed the request URL, which carries the API key.
fn request_error(endpoint: &str, err: reqwest::Error) -> MovieBrowserError {
    let err = err.without_url();
    if err.is_timeout() {
        MovieBrowserError::Timeout(NetworkConfig::REQUEST_TIMEOUT)
    } else {
        MovieBrowserError::Network {
            message: format!("GET {} failed: {}", endpoint, err),
            cause: std::error::Error::source(&err).map(|s| s.to_string()),
        }
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> MovieBrowserError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.status_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    MovieBrowserError::Api {
        status_code: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TmdbClient {
        TmdbClient::with_base_url("https://api.example.test/3", "secret", None).unwrap()
    }

    #[test]
    fn test_endpoint_url_has_no_api_key() {
        let url = client().endpoint_url("movie/now_playing", Some(2)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/3/movie/now_playing?page=2"
        );
        assert!(!url.as_str().contains("secret"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(client().base_url().as_str(), "https://api.example.test/3/");
        assert!(TmdbClient::with_base_url("not a url", "k", None).is_err());
    }

    #[test]
    fn test_api_error_uses_status_message() {
        let body = br#"{"status_code":7,"status_message":"Invalid API key","success":false}"#;
        match api_error(StatusCode::UNAUTHORIZED, body) {
            MovieBrowserError::Api {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_reason() {
        let err = api_error(StatusCode::SERVICE_UNAVAILABLE, b"<html>");
        assert_eq!(err.to_string(), "TMDb API error (503): Service Unavailable");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_exhausted_cursor_skips_network() {
        let last = MoviePage {
            page: 4,
            total_pages: 4,
            total_results: 80,
            results: Vec::new(),
        };
        let page = client().now_playing(Some(&last)).await.unwrap();
        assert_eq!(page, PagingEnvelope::empty());
    }

    #[tokio::test]
    async fn test_clear_cache_without_cache_succeeds() {
        assert!(client().clear_cache().await.unwrap());
    }
}
