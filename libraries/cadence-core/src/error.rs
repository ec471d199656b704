//! Error types for the playback engine

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Source could not be opened or decoded far enough to start playback
    #[error("failed to load media source: {0}")]
    Load(String),

    /// Operation requires a loaded source (e.g. `play()` before `load()`)
    #[error("no media loaded")]
    NotLoaded,

    /// Backend reported a mid-playback decode failure
    #[error("decode error: {0}")]
    Decode(String),

    /// The fallback decoder toolchain is missing on this platform
    #[error("fallback backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Seek target outside the track or unsupported by the decoder
    #[error("invalid seek position: {0:?}")]
    InvalidSeekPosition(Duration),

    /// Queue index out of bounds
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Coarse classification used when surfacing errors as events
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::Load(_) => ErrorKind::Load,
            PlaybackError::NotLoaded => ErrorKind::NotLoaded,
            PlaybackError::Decode(_) => ErrorKind::Decode,
            PlaybackError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            PlaybackError::InvalidSeekPosition(_) => ErrorKind::InvalidSeek,
            PlaybackError::IndexOutOfBounds(_) => ErrorKind::InvalidIndex,
            PlaybackError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Serializable error classification for event consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad or unreadable source
    Load,
    /// Operation before a successful load
    NotLoaded,
    /// Mid-playback decode failure
    Decode,
    /// Fallback decoder missing on this platform
    BackendUnavailable,
    /// Seek rejected
    InvalidSeek,
    /// Queue index out of bounds
    InvalidIndex,
    /// Underlying IO failure
    Io,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_classification() {
        assert_eq!(PlaybackError::NotLoaded.kind(), ErrorKind::NotLoaded);
        assert_eq!(
            PlaybackError::Load("missing".into()).kind(),
            ErrorKind::Load
        );
        assert_eq!(
            PlaybackError::Decode("bad frame".into()).kind(),
            ErrorKind::Decode
        );
    }

    #[test]
    fn display_messages() {
        let err = PlaybackError::Load("no such file".into());
        assert_eq!(err.to_string(), "failed to load media source: no such file");
        assert_eq!(PlaybackError::NotLoaded.to_string(), "no media loaded");
    }
}
