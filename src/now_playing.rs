//! Resolves the music service's playback state to at most one image.

use std::sync::Arc;

use image::DynamicImage;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::auth::TokenCache;
use crate::error::{FrameError, Result};
use crate::ports::{ImageFetcher, NowPlayingProvider};

/// What the player is doing right now. Rebuilt every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    NotPlaying,
    /// A music track; carries the largest album-art URL when the service sent one.
    Track { art_url: Option<String> },
    Episode,
    /// Ads, line-in, or anything else the service reports.
    Other(String),
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    currently_playing_type: Option<String>,
    #[serde(default)]
    item: Option<PlayingItem>,
}

#[derive(Debug, Deserialize)]
struct PlayingItem {
    #[serde(default)]
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<AlbumImage>,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    url: String,
}

impl PlaybackState {
    /// Interpret a 200 body from the currently-playing endpoint.
    pub fn from_body(body: &str) -> Result<Self> {
        let parsed: CurrentlyPlaying = serde_json::from_str(body)
            .map_err(|e| FrameError::Parse(format!("currently-playing body: {e}")))?;

        if !parsed.is_playing {
            return Ok(PlaybackState::NotPlaying);
        }

        let kind = parsed.currently_playing_type.unwrap_or_default();
        Ok(match kind.as_str() {
            "track" => PlaybackState::Track {
                // Spotify lists album images largest first.
                art_url: parsed
                    .item
                    .and_then(|item| item.album)
                    .and_then(|album| album.images.into_iter().next())
                    .map(|image| image.url),
            },
            "episode" => PlaybackState::Episode,
            _ => PlaybackState::Other(kind),
        })
    }
}

/// Queries the player each tick and turns its state into a displayable image.
pub struct NowPlayingSource {
    tokens: TokenCache,
    player: Arc<dyn NowPlayingProvider>,
    fetcher: Arc<dyn ImageFetcher>,
    placeholder: Option<DynamicImage>,
}

impl NowPlayingSource {
    pub fn new(
        tokens: TokenCache,
        player: Arc<dyn NowPlayingProvider>,
        fetcher: Arc<dyn ImageFetcher>,
        placeholder: Option<DynamicImage>,
    ) -> Self {
        Self {
            tokens,
            player,
            fetcher,
            placeholder,
        }
    }

    /// Fetch the current playback state.
    ///
    /// A 401 invalidates the cached token and fails the call; the next call
    /// performs a fresh exchange.
    pub async fn playback_state(&mut self) -> Result<PlaybackState> {
        let token = self.tokens.get_token().await?;
        let reply = self.player.currently_playing(&token.value).await?;

        match reply.status {
            StatusCode::NO_CONTENT => Ok(PlaybackState::NotPlaying),
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate();
                Err(FrameError::Auth("access token rejected".into()))
            }
            StatusCode::OK => PlaybackState::from_body(&reply.body),
            status => Err(FrameError::Provider {
                status: status.as_u16(),
                body: reply.body,
            }),
        }
    }

    /// Resolve the image to show for what is playing, if anything.
    ///
    /// Album-art download failures are logged and reported as nothing playing
    /// so the caller falls back to the slideshow.
    pub async fn get_current_image(&mut self) -> Result<Option<DynamicImage>> {
        match self.playback_state().await? {
            PlaybackState::NotPlaying => Ok(None),
            PlaybackState::Track { art_url: None } => {
                tracing::warn!("Track is playing but has no album art");
                Ok(None)
            }
            PlaybackState::Track {
                art_url: Some(url),
            } => match self.fetcher.fetch(&url).await {
                Ok(image) => Ok(Some(image)),
                Err(e) => {
                    tracing::warn!("Album art failed to load: {} [{}]", url, e);
                    Ok(None)
                }
            },
            PlaybackState::Episode => {
                if self.placeholder.is_none() {
                    tracing::debug!("Episode playing but no placeholder image is loaded");
                }
                Ok(self.placeholder.clone())
            }
            PlaybackState::Other(kind) => {
                tracing::debug!(kind = %kind, "Nothing to show for this playback type");
                Ok(None)
            }
        }
    }
}
