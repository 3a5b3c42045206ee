//! Fallback slideshow over the stored image list.

use std::sync::Arc;

use image::DynamicImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::{FrameError, Result};
use crate::ports::ImageFetcher;
use crate::store::{ImageStore, StoreEntry};

/// How the next slideshow entry is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Walk the list in order, wrapping to the start after the last entry.
    #[default]
    Sequential,
    /// Pick uniformly from the whole list on every call.
    Random,
}

/// Cursor over the stored entries. Never writes to the store.
pub struct SlideshowCursor {
    store: ImageStore,
    entries: Vec<StoreEntry>,
    position: usize,
    strategy: SelectionStrategy,
    rng: StdRng,
    fetcher: Arc<dyn ImageFetcher>,
}

impl SlideshowCursor {
    /// Load the store once and start at the first entry.
    pub fn open(
        store: ImageStore,
        strategy: SelectionStrategy,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self> {
        let entries = store.load()?.tweets;
        tracing::info!(
            "Slideshow loaded {} images from {} ({:?})",
            entries.len(),
            store.path().display(),
            strategy
        );
        Ok(Self {
            store,
            entries,
            position: 0,
            strategy,
            rng: StdRng::from_entropy(),
            fetcher,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Choose the next entry and advance.
    ///
    /// An empty list is re-read from disk once, so a store populated after
    /// startup is picked up without a restart.
    pub fn next_entry(&mut self) -> Result<&StoreEntry> {
        if self.entries.is_empty() {
            self.entries = self.store.load()?.tweets;
            self.position = 0;
            if self.entries.is_empty() {
                return Err(FrameError::EmptyStore);
            }
            tracing::info!("Slideshow picked up {} new images", self.entries.len());
        }

        let len = self.entries.len();
        let index = match self.strategy {
            SelectionStrategy::Sequential => {
                let index = self.position % len;
                self.position = (index + 1) % len;
                index
            }
            SelectionStrategy::Random => self.rng.gen_range(0..len),
        };
        Ok(&self.entries[index])
    }

    /// Advance and download the chosen image.
    ///
    /// The cursor has already moved when a fetch fails, so one bad entry does
    /// not stall the slideshow.
    pub async fn next_image(&mut self) -> Result<DynamicImage> {
        let url = self.next_entry()?.url.clone();
        tracing::debug!("Slideshow showing {}", url);
        self.fetcher.fetch(&url).await
    }
}
