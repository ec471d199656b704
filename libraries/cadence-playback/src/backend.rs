//! Platform-agnostic playback backend trait
//!
//! A backend wraps one decode/output session. Two implementations exist in
//! `cadence-audio-desktop`: the primary backend (broad codec coverage, used
//! by default) and the fallback backend (alternate decoder process for
//! formats the primary is known to mis-handle, e.g. lossless codecs with
//! encoder-padding quirks).

use cadence_core::{ErrorKind, MediaSource, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which backend implementation a session runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Default decoder, broad format support
    Primary,
    /// Alternate decoder for problematic formats; coarse (~200 ms) timing
    Fallback,
}

/// Backend-level playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendState {
    /// No source loaded, or loaded but not started
    Idle,
    /// Producing audio
    Playing,
    /// Paused mid-track
    Paused,
    /// Stopped; `load` may be called again
    Stopped,
    /// Unrecoverable decode failure
    Errored,
}

/// Events a backend reports to the controller
///
/// Events accumulate inside the adapter and are handed over when the
/// controller polls on its tick. The primary backend reports position at
/// roughly the tick interval; the fallback backend refreshes at ~200 ms
/// granularity, so its position and end-of-media events arrive coarser.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Playback position moved
    PositionChanged(Duration),
    /// Total duration became known or changed
    DurationChanged(Duration),
    /// Backend state changed for an internal reason
    StateChanged(BackendState),
    /// End of media reached
    Ended,
    /// Mid-playback failure
    Error {
        /// Coarse classification
        kind: ErrorKind,
        /// Human-readable description
        message: String,
    },
}

/// One decode/output session
///
/// Contract:
/// - `load` is safe to call again after `stop()`
/// - `play` before a successful `load` fails with `NotLoaded`
/// - volume is linear gain; out-of-range input is clamped, never an error
///
/// Backends are created, driven, and dropped on the single playback thread;
/// the trait deliberately has no `Send` bound because platform audio handles
/// are usually tied to the thread that opened them.
pub trait PlaybackBackend {
    /// Load a source, replacing anything previously loaded
    fn load(&mut self, source: &MediaSource) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the source loaded
    fn pause(&mut self);

    /// Stop playback and release the decode pipeline
    fn stop(&mut self);

    /// Seek to a position from the start of the track
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Current playback position
    fn position(&self) -> Duration;

    /// Total duration, when the decoder knows it
    fn duration(&self) -> Option<Duration>;

    /// Linear output gain in `[0.0, 1.0]`; out-of-range values are clamped
    fn set_volume(&mut self, gain: f32);

    /// Current backend state
    fn state(&self) -> BackendState;

    /// Which implementation this is
    fn kind(&self) -> BackendKind;

    /// Drain events accumulated since the last poll
    fn poll(&mut self) -> Vec<BackendEvent>;
}

/// Platform seam: creates backends on demand
///
/// The controller asks for a backend per session; during a crossfade two
/// live backends exist at once, so `create` must return independent
/// instances.
pub trait BackendFactory {
    /// Create a backend of the requested kind
    ///
    /// Implementations may substitute `Primary` for an unavailable
    /// `Fallback` (logged degradation), but must never fail for `Primary`
    /// when the platform has a working audio output.
    fn create(&self, kind: BackendKind) -> Result<Box<dyn PlaybackBackend>>;

    /// Whether the fallback decoder is usable on this platform
    fn fallback_available(&self) -> bool;
}
