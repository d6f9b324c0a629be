//! Error types for the movie browser model layer.
//!
//! Errors are `Clone` so a single failure can be handed to every caller that
//! awaits the same coalesced operation; underlying sources are kept behind
//! `Arc` for that reason.

use crate::config::NetworkConfig;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for the movie browser library.
#[derive(Debug, Clone, Error)]
pub enum MovieBrowserError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("TMDb API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Arc<rusqlite::Error>>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<Arc<serde_json::Error>>,
    },

    // Model errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Movie not found: {id}")]
    MovieNotFound { id: i64 },

    #[error("Failed to clear {stage}")]
    ClearFailed { stage: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for movie browser operations.
pub type Result<T> = std::result::Result<T, MovieBrowserError>;

// Conversion implementations for common error types

impl From<std::io::Error> for MovieBrowserError {
    fn from(err: std::io::Error) -> Self {
        MovieBrowserError::Io {
            message: err.to_string(),
            path: None,
            source: Some(Arc::new(err)),
        }
    }
}

impl From<serde_json::Error> for MovieBrowserError {
    fn from(err: serde_json::Error) -> Self {
        MovieBrowserError::Json {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

impl From<rusqlite::Error> for MovieBrowserError {
    fn from(err: rusqlite::Error) -> Self {
        MovieBrowserError::Database {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

impl From<reqwest::Error> for MovieBrowserError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MovieBrowserError::Timeout(NetworkConfig::REQUEST_TIMEOUT)
        } else {
            MovieBrowserError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl From<tokio::task::JoinError> for MovieBrowserError {
    fn from(err: tokio::task::JoinError) -> Self {
        MovieBrowserError::Other(format!("Background task failed: {}", err))
    }
}

impl MovieBrowserError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MovieBrowserError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(Arc::new(err)),
        }
    }

    /// Create a database error with a context message.
    pub fn database(context: &str, err: rusqlite::Error) -> Self {
        MovieBrowserError::Database {
            message: format!("{}: {}", context, err),
            source: Some(Arc::new(err)),
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// The model layer itself never retries; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            MovieBrowserError::Network { .. } | MovieBrowserError::Timeout(_) => true,
            MovieBrowserError::Api { status_code, .. } => {
                matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Whether this error reports a violated precondition rather than a
    /// failed operation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, MovieBrowserError::InvalidArgument(_))
    }
}
