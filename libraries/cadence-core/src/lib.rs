//! Cadence - Core Types
//!
//! Shared data model for the Cadence playback engine:
//! - Queue items and media sources (local files, remote library entries)
//! - Player settings (mix method, transition duration, silence detection)
//! - Playback state
//! - The playback error taxonomy
//!
//! This crate has no audio, I/O, or platform dependencies. Everything that
//! decodes or plays audio lives in `cadence-playback` (engine) and
//! `cadence-audio-desktop` (backends).

pub mod error;
pub mod types;

pub use error::{ErrorKind, PlaybackError, Result};
pub use types::{
    ItemKind, MediaSource, MixMethod, PlaybackState, PlayerSettings, QueueItem,
    SERVE_AUDIO_ROUTE, TRANSITION_DURATION_RANGE,
};
