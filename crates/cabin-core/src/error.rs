//! Error types for cabin-core.

use thiserror::Error;

/// Error type for cabin-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The external player has not exposed a renderable stream yet. Retryable.
    #[error("Stream source not available")]
    SourceUnavailable,

    #[error("Rendering backend error: {0}")]
    RenderingBackend(String),

    #[cfg(feature = "cpal")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failed operation may succeed if attempted again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::SourceUnavailable)
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
