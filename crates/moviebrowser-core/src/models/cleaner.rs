//! Staged removal of favorites and cached data.

use super::FavoriteMovieCollection;
use crate::config::CleanerConfig;
use crate::error::{MovieBrowserError, Result};
use crate::repository::{FavoriteStore, ImageCache, MovieDbService};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Progress reported by [`DataCleaner::clear_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleaningStage {
    Favorites,
    HttpCache,
    ImageCache,
    Complete,
}

impl CleaningStage {
    pub fn description(&self) -> &'static str {
        match self {
            CleaningStage::Favorites => "Removing favorites",
            CleaningStage::HttpCache => "Clearing network cache",
            CleaningStage::ImageCache => "Clearing image cache",
            CleaningStage::Complete => "Done",
        }
    }
}

impl fmt::Display for CleaningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Clears local data one stage at a time.
///
/// Each stage is announced before its work runs and stays current for at
/// least the minimum stage duration, so a progress display never flickers.
#[derive(Clone)]
pub struct DataCleaner {
    favorites: FavoriteMovieCollection,
    favorite_store: Arc<dyn FavoriteStore>,
    movie_db: Arc<dyn MovieDbService>,
    image_cache: Arc<dyn ImageCache>,
    min_stage_duration: Duration,
}

struct Progress {
    cleaner: DataCleaner,
    stages: VecDeque<CleaningStage>,
    running: Option<CleaningStage>,
    last_emitted: Option<Instant>,
    finished: bool,
}

impl DataCleaner {
    pub fn new(
        favorites: FavoriteMovieCollection,
        favorite_store: Arc<dyn FavoriteStore>,
        movie_db: Arc<dyn MovieDbService>,
        image_cache: Arc<dyn ImageCache>,
    ) -> Self {
        Self {
            favorites,
            favorite_store,
            movie_db,
            image_cache,
            min_stage_duration: CleanerConfig::MIN_STAGE_DURATION,
        }
    }

    pub fn with_min_stage_duration(mut self, duration: Duration) -> Self {
        self.min_stage_duration = duration;
        self
    }

    /// Run the pipeline, yielding each stage as it starts.
    ///
    /// The stream ends after [`CleaningStage::Complete`], or right after the
    /// first error. Stages already finished are not undone.
    pub fn clear_data(&self, clear_favorites: bool) -> BoxStream<'static, Result<CleaningStage>> {
        let mut stages = VecDeque::with_capacity(4);
        if clear_favorites {
            stages.push_back(CleaningStage::Favorites);
        }
        stages.extend([
            CleaningStage::HttpCache,
            CleaningStage::ImageCache,
            CleaningStage::Complete,
        ]);

        let progress = Progress {
            cleaner: self.clone(),
            stages,
            running: None,
            last_emitted: None,
            finished: false,
        };

        stream::unfold(progress, |mut progress| async move {
            if progress.finished {
                return None;
            }

            if let Some(stage) = progress.running.take() {
                if let Err(e) = progress.cleaner.run_stage(stage).await {
                    warn!("Data cleaning failed during {:?}: {}", stage, e);
                    progress.finished = true;
                    return Some((Err(e), progress));
                }
            }

            let stage = progress.stages.pop_front()?;
            if let Some(last) = progress.last_emitted {
                let remaining = progress
                    .cleaner
                    .min_stage_duration
                    .saturating_sub(last.elapsed());
                if !remaining.is_zero() {
                    tokio::time::sleep(remaining).await;
                }
            }
            progress.last_emitted = Some(Instant::now());

            info!("Data cleaning: {}", stage);
            if stage == CleaningStage::Complete {
                progress.finished = true;
            } else {
                progress.running = Some(stage);
            }
            Some((Ok(stage), progress))
        })
        .boxed()
    }

    async fn run_stage(&self, stage: CleaningStage) -> Result<()> {
        match stage {
            CleaningStage::Favorites => {
                self.favorites.clear();
                let cleared = self.favorite_store.clear_data().await?;
                ensure_cleared(cleared, stage)
            }
            CleaningStage::HttpCache => {
                let cleared = self.movie_db.clear_cache().await?;
                ensure_cleared(cleared, stage)
            }
            CleaningStage::ImageCache => self.image_cache.clear_disk_cache().await,
            CleaningStage::Complete => Ok(()),
        }
    }
}

fn ensure_cleared(cleared: bool, stage: CleaningStage) -> Result<()> {
    if cleared {
        Ok(())
    } else {
        Err(MovieBrowserError::ClearFailed {
            stage: format!("{:?}", stage),
        })
    }
}

impl fmt::Debug for DataCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataCleaner")
            .field("min_stage_duration", &self.min_stage_duration)
            .finish_non_exhaustive()
    }
}
