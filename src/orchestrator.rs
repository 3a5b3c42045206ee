//! The display loop: now-playing art when something is playing, the
//! slideshow otherwise.

use std::future::Future;
use std::time::Duration;

use image::DynamicImage;
use tokio::sync::watch;

use crate::config::IntervalSettings;
use crate::display::Display;
use crate::error::FrameError;
use crate::now_playing::NowPlayingSource;
use crate::slideshow::SlideshowCursor;

/// Flip the returned receiver to `true` once `signal` resolves.
///
/// If the signal cannot be awaited the sender is kept alive forever, so the
/// loop keeps running instead of treating the closed channel as shutdown.
pub fn shutdown_on<F>(signal: F) -> watch::Receiver<bool>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                tracing::info!("Interrupt received, finishing current tick");
                let _ = tx.send(true);
            }
            Err(e) => {
                tracing::error!("Cannot listen for shutdown signal, running without graceful shutdown: {}", e);
                std::future::pending::<()>().await;
                drop(tx);
            }
        }
    });
    rx
}

/// Which branch a tick took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPath {
    NowPlaying,
    Slideshow,
    /// No image was pushed this tick.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub path: TickPath,
    pub sleep: Duration,
}

pub struct PollingOrchestrator {
    now_playing: NowPlayingSource,
    slideshow: SlideshowCursor,
    display: Box<dyn Display>,
    now_playing_interval: Duration,
    slideshow_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PollingOrchestrator {
    pub fn new(
        now_playing: NowPlayingSource,
        slideshow: SlideshowCursor,
        display: Box<dyn Display>,
        intervals: &IntervalSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            now_playing,
            slideshow,
            display,
            now_playing_interval: intervals.now_playing(),
            slideshow_interval: intervals.slideshow(),
            shutdown,
        }
    }

    /// Tick until shutdown is signalled, then release the display.
    ///
    /// Shutdown is observed between ticks and during the sleep; a tick already
    /// in progress runs to completion.
    pub async fn run_forever(&mut self) {
        tracing::info!(
            now_playing_secs = self.now_playing_interval.as_secs(),
            slideshow_secs = self.slideshow_interval.as_secs(),
            "Display loop started"
        );

        while !*self.shutdown.borrow() {
            let report = self.tick().await;
            tracing::debug!(path = ?report.path, sleep_secs = report.sleep.as_secs(), "Tick done");

            tokio::select! {
                _ = tokio::time::sleep(report.sleep) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        tracing::warn!("Shutdown channel closed");
                        break;
                    }
                }
            }
        }

        tracing::info!("Shutting down");
        self.display.cleanup();
    }

    /// One loop body: resolve an image, push it, and report how long to sleep.
    pub async fn tick(&mut self) -> TickReport {
        let playing = match self.now_playing.get_current_image().await {
            Ok(image) => image,
            Err(FrameError::Auth(e)) => {
                tracing::warn!("Spotify authorization failed, falling back: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Could not read playback state, falling back: {}", e);
                None
            }
        };

        if let Some(image) = playing {
            self.push(&image);
            return TickReport {
                path: TickPath::NowPlaying,
                sleep: self.now_playing_interval,
            };
        }

        match self.slideshow.next_image().await {
            Ok(image) => {
                self.push(&image);
                TickReport {
                    path: TickPath::Slideshow,
                    sleep: self.slideshow_interval,
                }
            }
            Err(FrameError::EmptyStore) => {
                tracing::warn!("Slideshow store is empty; run ingestion to populate it");
                TickReport {
                    path: TickPath::Skipped,
                    sleep: self.slideshow_interval,
                }
            }
            Err(e) => {
                tracing::warn!("Skipping slideshow image: {}", e);
                TickReport {
                    path: TickPath::Skipped,
                    sleep: self.now_playing_interval,
                }
            }
        }
    }

    /// Show `image`; on failure the previous frame stays up.
    fn push(&mut self, image: &DynamicImage) {
        if let Err(e) = self.display.update(image) {
            tracing::error!("Display update failed: {}", e);
        }
    }
}
