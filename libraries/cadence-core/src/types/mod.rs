//! Core types for the playback engine

mod item;
mod settings;
mod state;

pub use item::{ItemKind, MediaSource, QueueItem, SERVE_AUDIO_ROUTE};
pub use settings::{MixMethod, PlayerSettings, TRANSITION_DURATION_RANGE};
pub use state::PlaybackState;
