//! Liked-posts ingestion into the image store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{FrameError, Result};
use crate::ports::FeedProvider;
use crate::store::ImageStore;

/// One page of the liked-posts endpoint.
#[derive(Debug, Deserialize)]
pub struct LikedPage {
    #[serde(default)]
    pub data: Vec<Post>,
    #[serde(default)]
    pub includes: Option<Includes>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub attachments: Option<Attachments>,
}

#[derive(Debug, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
pub struct Media {
    pub media_key: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub result_count: Option<u32>,
}

/// A qualifying post reduced to the one image we keep from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    pub post_id: String,
    pub media_key: String,
    pub author_id: String,
    pub image_url: String,
}

impl LikedPage {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| FrameError::Parse(format!("liked posts page: {e}")))
    }

    pub fn next_token(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.next_token.as_deref())
    }

    /// Posts on this page as reported by the API, falling back to what parsed.
    pub fn result_count(&self) -> usize {
        self.meta
            .as_ref()
            .and_then(|m| m.result_count)
            .map_or(self.data.len(), |n| n as usize)
    }

    /// Posts by `author_id` that reference a photo, with the first such photo.
    pub fn photo_posts(&self, author_id: &str) -> Vec<FeedPost> {
        let media: HashMap<&str, &Media> = self
            .includes
            .iter()
            .flat_map(|i| i.media.iter())
            .map(|m| (m.media_key.as_str(), m))
            .collect();

        self.data
            .iter()
            .filter(|post| post.author_id.as_deref() == Some(author_id))
            .filter_map(|post| {
                let keys = &post.attachments.as_ref()?.media_keys;
                let photo = keys.iter().find_map(|key| {
                    media
                        .get(key.as_str())
                        .filter(|m| m.media_type == "photo")
                        .and_then(|m| m.url.as_deref().map(|url| (m, url)))
                });
                photo.map(|(m, url)| FeedPost {
                    post_id: post.id.clone(),
                    media_key: m.media_key.clone(),
                    author_id: author_id.to_string(),
                    image_url: url.to_string(),
                })
            })
            .collect()
    }
}

/// Walks every page of liked posts and appends their photos to the store.
pub struct FeedIngestor {
    feed: Arc<dyn FeedProvider>,
    store: ImageStore,
    author_id: String,
}

impl FeedIngestor {
    pub fn new(feed: Arc<dyn FeedProvider>, store: ImageStore, author_id: impl Into<String>) -> Self {
        Self {
            feed,
            store,
            author_id: author_id.into(),
        }
    }

    /// Run to completion and return how many entries were appended.
    ///
    /// A failed page stops pagination; photos from earlier pages are still
    /// written before the error is returned.
    pub async fn ingest_all(&self) -> Result<usize> {
        let mut collected = Vec::new();
        let outcome = self.collect_pages(&mut collected).await;

        let added = self.store.append(collected.iter().map(|p| p.image_url.clone()))?;
        match outcome {
            Ok(pages) => {
                tracing::info!(pages, found = collected.len(), added, "Ingestion complete");
                Ok(added)
            }
            Err(e) => {
                tracing::warn!(found = collected.len(), added, "Ingestion stopped early: {}", e);
                Err(e)
            }
        }
    }

    async fn collect_pages(&self, collected: &mut Vec<FeedPost>) -> Result<usize> {
        let mut seen = HashSet::new();
        let mut pagination_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let reply = self.feed.liked_page(pagination_token.as_deref()).await?;
            if reply.status != StatusCode::OK {
                return Err(FrameError::Provider {
                    status: reply.status.as_u16(),
                    body: reply.body,
                });
            }

            let page = LikedPage::parse(&reply.body)?;
            pages += 1;

            let posts = page.photo_posts(&self.author_id);
            tracing::debug!(
                page = pages,
                posts = page.result_count(),
                photos = posts.len(),
                "Fetched liked posts"
            );
            for post in posts {
                if seen.insert(post.image_url.clone()) {
                    tracing::debug!(
                        post = %post.post_id,
                        media = %post.media_key,
                        author = %post.author_id,
                        "Collected {}",
                        post.image_url
                    );
                    collected.push(post);
                }
            }

            match page.next_token() {
                Some(token) => pagination_token = Some(token.to_string()),
                None => return Ok(pages),
            }
        }
    }
}
