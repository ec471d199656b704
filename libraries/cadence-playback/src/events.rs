//! Engine events
//!
//! Event-based communication for UI synchronization. The controller
//! accumulates events while processing commands and ticks; the host drains
//! them with [`TransitionController::take_events`](crate::TransitionController::take_events)
//! and renders them however it likes.

use cadence_core::{ErrorKind, PlaybackState};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// A different queue item became the active track
    TrackChanged {
        /// Queue index of the new active track
        index: usize,
    },

    /// Periodic position update from the active session
    PositionTick {
        /// Current position in milliseconds
        position_ms: u64,
        /// Total duration in milliseconds (0 while unknown)
        duration_ms: u64,
    },

    /// Engine-level playback state changed
    PlaybackStateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// A dual-session transition advanced
    TransitionProgress {
        /// Progress from 0.0 (just started) to 1.0 (complete)
        fraction: f32,
    },

    /// Playback failed and the engine is waiting for a decision
    ///
    /// Answer with [`ErrorDecision`] via
    /// [`TransitionController::resolve_error`](crate::TransitionController::resolve_error).
    PlaybackError {
        /// Coarse classification
        kind: ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// Navigation or natural playback ran past the last playable item
    ///
    /// A normal terminal state, not an error.
    QueueExhausted,
}

/// Caller's answer to a [`PlayerEvent::PlaybackError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorDecision {
    /// Skip the broken track and keep going
    Continue,
    /// Clear the queue and return to idle
    Stop,
}
