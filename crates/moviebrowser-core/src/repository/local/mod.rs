//! On-device persistence: favorites, settings and the image cache.

mod atomic;
mod config_store;
mod favorites;
mod image_cache;

pub use atomic::{read_json, write_json};
pub use config_store::JsonConfigStore;
pub use favorites::SqliteFavoriteStore;
pub use image_cache::DiskImageCache;
