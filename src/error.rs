//! Track ingestion error type.

use thiserror::Error;

/// Errors produced while loading track files.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX parse error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("no tracks found in {0}")]
    NoTracks(String),
}

pub type TrackResult<T> = Result<T, TrackError>;
