//! Image cache directory.

use crate::error::{MovieBrowserError, Result};
use crate::repository::ImageCache;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Downloaded images stored under a single directory.
#[derive(Debug, Clone)]
pub struct DiskImageCache {
    dir: PathBuf,
}

impl DiskImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageCache for DiskImageCache {
    /// Remove every cached file while keeping the directory itself.
    async fn clear_disk_cache(&self) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(MovieBrowserError::io_with_path(e, &self.dir)),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MovieBrowserError::io_with_path(e, &self.dir))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| MovieBrowserError::io_with_path(e, &path))?;
            let result = if file_type.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            result.map_err(|e| MovieBrowserError::io_with_path(e, &path))?;
            removed += 1;
        }

        debug!("Removed {} entries from {}", removed, self.dir.display());
        Ok(())
    }
}
