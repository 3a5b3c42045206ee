//! Now-playing picture frame.
//!
//! Shows the album art of whatever Spotify is playing and falls back to a
//! slideshow of photos collected from liked tweets.

pub mod assets;
pub mod auth;
pub mod config;
pub mod display;
pub mod error;
pub mod feed;
pub mod logging;
pub mod now_playing;
pub mod orchestrator;
pub mod ports;
#[cfg(feature = "sdl")]
pub mod renderer;
pub mod slideshow;
pub mod spotify;
pub mod store;
pub mod twitter;

#[cfg(test)]
mod testing;

use std::time::Duration;

use crate::config::HttpSettings;

/// One client shared by every outbound call.
pub fn build_http_client(settings: &HttpSettings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .pool_idle_timeout(Duration::from_secs(120))
        .build()
}
