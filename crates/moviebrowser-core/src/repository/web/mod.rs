//! Remote movie catalog access.

mod client;
mod http_cache;

pub use client::TmdbClient;
pub use http_cache::{HttpCache, HttpCacheConfig};
