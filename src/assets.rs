//! Image loading for both content sources.
//!
//! Downloads remote images over HTTP and decodes them in memory; also loads
//! the local placeholder shown for podcast episodes.

use std::path::Path;

use image::DynamicImage;
use reqwest::header::CONTENT_TYPE;

use crate::error::{FrameError, Result};
use crate::ports::ImageFetcher;

/// Fetches and decodes images with a shared reqwest client.
pub struct ReqwestImageFetcher {
    client: reqwest::Client,
}

impl ReqwestImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ImageFetcher for ReqwestImageFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage> {
        if url.is_empty() {
            return Err(FrameError::Fetch("empty image URL".into()));
        }

        tracing::debug!("Downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FrameError::Fetch(format!("problem connecting to {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FrameError::Fetch(format!("{url} returned {status}")));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.starts_with("image/") {
                return Err(FrameError::Fetch(format!(
                    "not a valid image type ({content_type}): {url}"
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FrameError::Fetch(format!("failed to read {url}: {e}")))?;

        decode(&bytes).map_err(|e| FrameError::Fetch(format!("{url}: {e}")))
    }
}

/// Decode encoded image bytes, guessing the format from the content.
pub fn decode(bytes: &[u8]) -> std::result::Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Load the episode placeholder. A missing or unreadable file disables it.
pub fn load_placeholder(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(image) => {
            tracing::debug!("Loaded placeholder image {}", path.display());
            Some(image)
        }
        Err(e) => {
            tracing::warn!("Placeholder image {} not available: {}", path.display(), e);
            None
        }
    }
}
