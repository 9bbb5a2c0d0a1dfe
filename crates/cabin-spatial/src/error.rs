//! Error types for cabin-spatial

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or duplicate speaker mounts. The previous layout is retained.
    #[error("Invalid speaker layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid panner configuration: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Core(#[from] cabin_core::Error),
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_retryable())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
