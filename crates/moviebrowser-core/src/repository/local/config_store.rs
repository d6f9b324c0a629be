//! JSON-file settings store.

use super::atomic::{read_json, write_json};
use crate::error::Result;
use crate::repository::ConfigStore;
use moviebrowser_common::recover;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// The JSON root object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigData {
    #[serde(default)]
    items: BTreeMap<String, String>,
    #[serde(default)]
    sets: BTreeMap<String, BTreeSet<String>>,
}

/// [`ConfigStore`] persisted to a single JSON document.
///
/// Reads are served from memory. Every save rewrites the whole document
/// atomically while holding the write lock, so concurrent saves serialize.
pub struct JsonConfigStore {
    path: PathBuf,
    data: RwLock<ConfigData>,
}

impl JsonConfigStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_json::<ConfigData>(&path) {
            Ok(data) => data.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable config {}: {}", path.display(), e);
                ConfigData::default()
            }
        };
        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut ConfigData)) -> Result<()> {
        let mut data = recover(self.data.write());
        let mut next = data.clone();
        apply(&mut next);
        write_json(&self.path, &next)?;
        *data = next;
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn config_item(&self, key: &str) -> Option<String> {
        recover(self.data.read()).items.get(key).cloned()
    }

    fn save_config_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|data| {
            data.items.insert(key.to_string(), value.to_string());
        })
    }

    fn config_set(&self, key: &str) -> Option<BTreeSet<String>> {
        recover(self.data.read()).sets.get(key).cloned()
    }

    fn save_config_set(&self, key: &str, values: &BTreeSet<String>) -> Result<()> {
        self.update(|data| {
            data.sets.insert(key.to_string(), values.clone());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ConfigKeys;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let store = JsonConfigStore::open(&path);
        store
            .save_config_item(ConfigKeys::TMDB_IMAGE_BASE_URL, "http://img/")
            .unwrap();
        let sizes: BTreeSet<String> = ["w92", "w154"].iter().map(|s| s.to_string()).collect();
        store
            .save_config_set(ConfigKeys::TMDB_POSTER_SIZES, &sizes)
            .unwrap();

        let reopened = JsonConfigStore::open(&path);
        assert_eq!(
            reopened.config_item(ConfigKeys::TMDB_IMAGE_BASE_URL).as_deref(),
            Some("http://img/")
        );
        assert_eq!(reopened.config_set(ConfigKeys::TMDB_POSTER_SIZES), Some(sizes));
        assert!(reopened.config_item("missing").is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "[[[").unwrap();

        let store = JsonConfigStore::open(&path);
        assert!(store.config_item(ConfigKeys::TMDB_IMAGE_BASE_URL).is_none());

        store.save_config_item("k", "v").unwrap();
        assert_eq!(JsonConfigStore::open(&path).config_item("k").as_deref(), Some("v"));
    }
}
