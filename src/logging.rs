//! Tracing setup: stdout always, plus an optional append-only log file.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// flushes the file writer and must be held for the life of the process.
pub fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let level = &settings.level;
    let default = format!("{level},nowplaying_frame={level},reqwest=warn,hyper=warn,hyper_util=warn");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let (file_layer, guard, file_error) = match settings.file.as_deref() {
        Some(path) => match open_log_file(path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
                (Some(layer), Some(guard), None)
            }
            Err(e) => (None, None, Some(e)),
        },
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    match (settings.file.as_deref(), file_error) {
        (Some(path), Some(e)) => tracing::error!(
            "Cannot write to {}, check permissions and ensure directory exists: {}",
            path.display(),
            e
        ),
        (Some(path), None) => tracing::info!("Writing to log file: {}", path.display()),
        _ => {}
    }

    guard
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}
