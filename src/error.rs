//! Error types shared by every content source.

use thiserror::Error;

/// Failures raised while resolving, fetching, or showing an image.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Token exchange failed or the bearer token was rejected.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// A provider answered with a status we do not handle.
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// A response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Parse(String),

    /// An image could not be downloaded or decoded.
    #[error("image fetch failed: {0}")]
    Fetch(String),

    /// The slideshow was asked for an image but the store is empty.
    #[error("image store is empty")]
    EmptyStore,

    /// The display could not be initialised.
    #[error("display setup failed: {0}")]
    DisplaySetup(String),

    /// Pushing a frame to an initialised display failed.
    #[error("display update failed: {0}")]
    Display(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("image store I/O: {0}")]
    Store(#[from] std::io::Error),
}

impl FrameError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FrameError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
