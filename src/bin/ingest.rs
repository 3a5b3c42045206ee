//! Walks the configured account's liked tweets and appends their photos to the
//! slideshow store.

use std::sync::Arc;

use anyhow::{Context, Result};

use nowplaying_frame::config::Settings;
use nowplaying_frame::feed::FeedIngestor;
use nowplaying_frame::store::ImageStore;
use nowplaying_frame::twitter::TwitterLikes;
use nowplaying_frame::{build_http_client, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    let _log_guard = logging::init_logging(&settings.logging);
    tracing::info!("nowplaying-frame ingest {}", env!("CARGO_PKG_VERSION"));
    settings.log_warnings();

    settings.require_twitter()?;

    let client = build_http_client(&settings.http).context("Failed to build HTTP client")?;
    let ingestor = FeedIngestor::new(
        Arc::new(TwitterLikes::new(client, &settings.twitter)),
        ImageStore::new(&settings.store.path),
        settings.twitter.author_id.clone(),
    );

    let added = ingestor.ingest_all().await.context("Ingestion failed")?;
    println!("Added {} images to {}", added, settings.store.path.display());
    Ok(())
}
