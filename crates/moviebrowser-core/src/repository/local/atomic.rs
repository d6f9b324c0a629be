//! Crash-safe JSON persistence.
//!
//! Writes go to a process/thread-unique temp file next to the target, are
//! synced to disk and then renamed over the target, so readers see either
//! the old or the new document and never a torn one.

use crate::error::{MovieBrowserError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;
use std::{process, thread};
use tracing::debug;

/// Read and parse a JSON file. A missing file reads as `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MovieBrowserError::io_with_path(e, path)),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| MovieBrowserError::Json {
            message: format!("Failed to parse {}: {}", path.display(), e),
            source: Some(std::sync::Arc::new(e)),
        })
}

/// Serialize `data` and atomically replace `path` with it.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MovieBrowserError::io_with_path(e, parent))?;
    }

    let serialized = serde_json::to_string_pretty(data)?;
    let temp_path = path.with_extension(format!("json.{}.{}.tmp", process::id(), thread_tag()));

    let written = (|| -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(MovieBrowserError::io_with_path(e, &temp_path));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        MovieBrowserError::io_with_path(e, path)
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn thread_tag() -> u64 {
    let mut hasher = DefaultHasher::new();
    thread::current().id().hash(&mut hasher);
    hasher.finish()
}
