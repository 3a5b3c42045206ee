//! Settings loading.
//!
//! Values come from a TOML file (`FRAME_CONFIG`, default `frame.toml`) layered
//! under `FRAME__SECTION__KEY` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::slideshow::SelectionStrategy;

const DEFAULT_CONFIG_PATH: &str = "frame.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub spotify: SpotifySettings,
    #[serde(default)]
    pub twitter: TwitterSettings,
    #[serde(default)]
    pub intervals: IntervalSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_spotify_token_url")]
    pub token_url: String,
    #[serde(default = "default_spotify_api_base")]
    pub api_base: String,
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: default_spotify_token_url(),
            api_base: default_spotify_api_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterSettings {
    /// Bearer token for the v2 API.
    #[serde(default)]
    pub api_key: String,
    /// Account whose likes are read.
    #[serde(default)]
    pub user_id: String,
    /// Only posts by this author are collected.
    #[serde(default)]
    pub author_id: String,
    #[serde(default = "default_twitter_api_base")]
    pub api_base: String,
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_id: String::new(),
            author_id: String::new(),
            api_base: default_twitter_api_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntervalSettings {
    #[serde(default = "default_now_playing_secs")]
    pub now_playing_secs: u64,
    #[serde(default = "default_slideshow_secs")]
    pub slideshow_secs: u64,
}

impl Default for IntervalSettings {
    fn default() -> Self {
        Self {
            now_playing_secs: default_now_playing_secs(),
            slideshow_secs: default_slideshow_secs(),
        }
    }
}

impl IntervalSettings {
    pub fn now_playing(&self) -> Duration {
        Duration::from_secs(self.now_playing_secs)
    }

    pub fn slideshow(&self) -> Duration {
        Duration::from_secs(self.slideshow_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub strategy: SelectionStrategy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            strategy: SelectionStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    #[default]
    File,
    Sdl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub backend: DisplayBackend,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_panel_size")]
    pub width: u32,
    #[serde(default = "default_panel_size")]
    pub height: u32,
    /// Shown while a podcast episode is playing.
    #[serde(default = "default_placeholder")]
    pub placeholder: PathBuf,
    #[serde(default)]
    pub overlay_text: Option<String>,
    /// Detail toggles for backends that draw a caption strip.
    #[serde(default)]
    pub show_details: bool,
    #[serde(default)]
    pub show_artist_and_album: bool,
    #[serde(default)]
    pub show_play_state: bool,
    #[serde(default = "default_transition")]
    pub transition: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            backend: DisplayBackend::default(),
            output_path: default_output_path(),
            width: default_panel_size(),
            height: default_panel_size(),
            placeholder: default_placeholder(),
            overlay_text: None,
            show_details: false,
            show_artist_and_album: false,
            show_play_state: false,
            transition: default_transition(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_spotify_token_url() -> String {
    "https://accounts.spotify.com/api/token".into()
}
fn default_spotify_api_base() -> String {
    "https://api.spotify.com/v1".into()
}
fn default_twitter_api_base() -> String {
    "https://api.twitter.com/2".into()
}
fn default_now_playing_secs() -> u64 {
    4
}
fn default_slideshow_secs() -> u64 {
    30
}
fn default_store_path() -> PathBuf {
    PathBuf::from("tweets.json")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("frame.png")
}
fn default_panel_size() -> u32 {
    720
}
fn default_placeholder() -> PathBuf {
    PathBuf::from("tv.png")
}
fn default_transition() -> String {
    "cut".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    concat!("nowplaying-frame/", env!("CARGO_PKG_VERSION")).into()
}

impl Settings {
    /// Load from the file named by `FRAME_CONFIG` (or `frame.toml`) plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("FRAME_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let raw = Config::builder()
            .add_source(File::with_name(path).required(true))
            .add_source(Environment::with_prefix("FRAME").prefix_separator("__").separator("__"))
            .build()?;
        let settings: Settings = raw.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from an inline TOML document, without environment overrides.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let raw = Config::builder()
            .add_source(File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        let settings: Settings = raw.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.intervals.now_playing_secs == 0 || self.intervals.slideshow_secs == 0 {
            return Err(ConfigError::Invalid("intervals must be at least one second".into()));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid("display size must be non-zero".into()));
        }
        Ok(())
    }

    /// Settings that load fine but are probably mistakes.
    ///
    /// Returned rather than logged because loading happens before the
    /// subscriber is installed.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.intervals.slideshow_secs < self.intervals.now_playing_secs {
            warnings.push(format!(
                "slideshow interval ({}s) is shorter than the now-playing interval ({}s)",
                self.intervals.slideshow_secs, self.intervals.now_playing_secs
            ));
        }
        warnings
    }

    /// Log everything `warnings` reports. Call after logging is initialized.
    pub fn log_warnings(&self) {
        for warning in self.warnings() {
            tracing::warn!("Config: {}", warning);
        }
    }

    /// Check the credentials the display loop needs.
    pub fn require_spotify(&self) -> Result<(), ConfigError> {
        require("spotify.client_id", &self.spotify.client_id)?;
        require("spotify.client_secret", &self.spotify.client_secret)?;
        require("spotify.refresh_token", &self.spotify.refresh_token)
    }

    /// Check the identifiers and key the ingestion run needs.
    pub fn require_twitter(&self) -> Result<(), ConfigError> {
        require("twitter.api_key", &self.twitter.api_key)?;
        require("twitter.user_id", &self.twitter.user_id)?;
        require("twitter.author_id", &self.twitter.author_id)
    }
}

fn require(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let settings = Settings::from_toml(
            r#"
            [spotify]
            client_id = "id"
            client_secret = "secret"
            refresh_token = "refresh"
            "#,
        )
        .expect("parse settings");

        assert_eq!(settings.intervals.now_playing(), Duration::from_secs(4));
        assert_eq!(settings.intervals.slideshow(), Duration::from_secs(30));
        assert_eq!(settings.store.path, PathBuf::from("tweets.json"));
        assert_eq!(settings.store.strategy, SelectionStrategy::Sequential);
        assert_eq!(settings.display.backend, DisplayBackend::File);
        assert!(settings.require_spotify().is_ok());
    }

    #[test]
    fn missing_credentials_are_reported_by_key() {
        let settings = Settings::from_toml(
            r#"
            [twitter]
            api_key = "key"
            user_id = "  "
            "#,
        )
        .expect("parse settings");

        match settings.require_twitter() {
            Err(ConfigError::Missing(key)) => assert_eq!(key, "twitter.user_id"),
            other => panic!("expected missing user_id, got {other:?}"),
        }
        assert!(matches!(
            settings.require_spotify(),
            Err(ConfigError::Missing("spotify.client_id"))
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = Settings::from_toml(
            r#"
            [intervals]
            now_playing_secs = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn random_strategy_and_sdl_backend_parse() {
        let settings = Settings::from_toml(
            r#"
            [store]
            strategy = "random"
            [display]
            backend = "sdl"
            overlay_text = "hello"
            "#,
        )
        .expect("parse settings");
        assert_eq!(settings.store.strategy, SelectionStrategy::Random);
        assert_eq!(settings.display.backend, DisplayBackend::Sdl);
        assert_eq!(settings.display.overlay_text.as_deref(), Some("hello"));
        assert!(!settings.display.show_details);
    }

    #[test]
    fn detail_toggles_are_accepted() {
        let settings = Settings::from_toml(
            r#"
            [display]
            show_details = true
            show_artist_and_album = true
            show_play_state = true
            "#,
        )
        .expect("parse settings");
        assert!(settings.display.show_details);
        assert!(settings.display.show_artist_and_album);
        assert!(settings.display.show_play_state);
    }

    #[test]
    fn short_slideshow_interval_loads_with_a_warning() {
        let settings = Settings::from_toml(
            r#"
            [intervals]
            now_playing_secs = 10
            slideshow_secs = 2
            "#,
        )
        .expect("ordering is not a hard error");

        let warnings = settings.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("shorter"));
    }

    #[test]
    fn default_intervals_have_no_warnings() {
        let settings = Settings::from_toml("").expect("parse settings");
        assert!(settings.warnings().is_empty());
    }
}
