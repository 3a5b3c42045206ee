//! Capability interfaces for every outbound call.
//!
//! The reqwest-backed implementations live in `spotify`, `twitter` and
//! `assets`; tests substitute scripted fakes.

use image::DynamicImage;
use reqwest::StatusCode;

use crate::auth::Token;
use crate::error::Result;

/// Status and body of a provider response, left uninterpreted.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Exchanges stored credentials for a fresh bearer token.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn exchange(&self) -> Result<Token>;
}

/// Reads the music service's current playback state.
#[async_trait::async_trait]
pub trait NowPlayingProvider: Send + Sync {
    async fn currently_playing(&self, bearer: &str) -> Result<HttpReply>;
}

/// Reads one page of the liked-posts feed.
#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn liked_page(&self, pagination_token: Option<&str>) -> Result<HttpReply>;
}

/// Downloads and decodes a remote image.
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DynamicImage>;
}
