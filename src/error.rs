//! Centralized error type for the cabin-radio umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] cabin_core::Error),

    #[error("Spatial: {0}")]
    Spatial(#[from] cabin_spatial::Error),

    /// Playback start vetoed: engine and ignition are both off.
    #[error("Playback not permitted while engine and ignition are off")]
    PlaybackNotPermitted,

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.is_retryable(),
            Error::Spatial(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
