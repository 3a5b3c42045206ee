use std::sync::Arc;

use anyhow::{Context, Result};

use nowplaying_frame::assets::{load_placeholder, ReqwestImageFetcher};
use nowplaying_frame::auth::TokenCache;
use nowplaying_frame::config::Settings;
use nowplaying_frame::now_playing::NowPlayingSource;
use nowplaying_frame::orchestrator::{shutdown_on, PollingOrchestrator};
use nowplaying_frame::slideshow::SlideshowCursor;
use nowplaying_frame::spotify::{SpotifyPlayer, SpotifyTokenProvider};
use nowplaying_frame::store::ImageStore;
use nowplaying_frame::{build_http_client, display, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    let _log_guard = logging::init_logging(&settings.logging);
    tracing::info!("nowplaying-frame {}", env!("CARGO_PKG_VERSION"));
    settings.log_warnings();

    settings.require_spotify()?;

    let display = display::open(&settings.display).context("Display setup failed")?;

    let client = build_http_client(&settings.http).context("Failed to build HTTP client")?;
    let fetcher = Arc::new(ReqwestImageFetcher::new(client.clone()));

    let tokens = TokenCache::new(Arc::new(SpotifyTokenProvider::new(
        client.clone(),
        &settings.spotify,
    )));
    let now_playing = NowPlayingSource::new(
        tokens,
        Arc::new(SpotifyPlayer::new(client, &settings.spotify)),
        fetcher.clone(),
        load_placeholder(&settings.display.placeholder),
    );

    let slideshow = SlideshowCursor::open(
        ImageStore::new(&settings.store.path),
        settings.store.strategy,
        fetcher,
    )
    .context("Failed to open image store")?;

    let shutdown_rx = shutdown_on(tokio::signal::ctrl_c());

    let mut orchestrator = PollingOrchestrator::new(
        now_playing,
        slideshow,
        display,
        &settings.intervals,
        shutdown_rx,
    );
    orchestrator.run_forever().await;

    Ok(())
}
