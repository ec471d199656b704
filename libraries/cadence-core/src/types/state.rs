//! Playback state

use serde::{Deserialize, Serialize};

/// Engine-level playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,

    /// Audio is playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Stopped with a track still loaded
    Stopped,

    /// Parked on an error, waiting for a continue/stop decision
    Errored,
}
