//! Spotify Web API transport: token exchange and the currently-playing query.

use serde::Deserialize;

use crate::auth::Token;
use crate::config::SpotifySettings;
use crate::error::{FrameError, Result};
use crate::ports::{HttpReply, NowPlayingProvider, TokenProvider};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Refresh-token grant against the accounts service.
pub struct SpotifyTokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl SpotifyTokenProvider {
    pub fn new(client: reqwest::Client, settings: &SpotifySettings) -> Self {
        Self {
            client,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            refresh_token: settings.refresh_token.clone(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for SpotifyTokenProvider {
    async fn exchange(&self) -> Result<Token> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FrameError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FrameError::Auth(format!("token response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(FrameError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| FrameError::Auth(format!("malformed token response: {e}")))?;
        tracing::info!("Obtained new Spotify access token");
        Ok(Token::new(parsed.access_token))
    }
}

/// `GET /me/player/currently-playing`.
pub struct SpotifyPlayer {
    client: reqwest::Client,
    url: String,
}

impl SpotifyPlayer {
    pub fn new(client: reqwest::Client, settings: &SpotifySettings) -> Self {
        Self {
            client,
            url: format!(
                "{}/me/player/currently-playing",
                settings.api_base.trim_end_matches('/')
            ),
        }
    }
}

#[async_trait::async_trait]
impl NowPlayingProvider for SpotifyPlayer {
    async fn currently_playing(&self, bearer: &str) -> Result<HttpReply> {
        let response = self.client.get(&self.url).bearer_auth(bearer).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(HttpReply::new(status, body))
    }
}
