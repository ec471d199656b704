//! Transition modes, gain curves, and crossfade step state
//!
//! A transition interpolates the output gains of two concurrently playing
//! sessions over a fixed number of 100 ms ticks. The engine only drives the
//! two sessions' independent output volumes; it never mixes samples.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval between transition ticks, in milliseconds
pub const TICK_INTERVAL_MS: u64 = 100;

/// Where the incoming session is cued to on the first Scratch tick
pub const SCRATCH_CUE_OFFSET: Duration = Duration::from_millis(1000);

/// Concrete transition style, fixed at arm time
///
/// The settings-level [`MixMethod`](cadence_core::MixMethod) resolves to one
/// of these: `Auto` becomes `AutoLevel` with an analyzer-derived duration,
/// everything else maps one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionMode {
    /// Linear fade out / fade in
    Fade,
    /// Raised-cosine fade: slow start and end, fast middle
    Smooth,
    /// Incoming at full volume throughout, outgoing fades out linearly
    Full,
    /// Hard DJ-style cut: outgoing drops over the first half, then the
    /// incoming session (cued ~1 s in) jumps to full volume
    Scratch,
    /// Both sessions at full volume; relies on the cut point landing on
    /// trailing silence picked by the analyzer
    AutoLevel,
    /// No overlap: the next track starts only when the current one ends
    Cue,
}

impl TransitionMode {
    /// Resolve the settings-level mix method to a transition mode
    pub fn from_mix_method(method: cadence_core::MixMethod) -> Self {
        use cadence_core::MixMethod;
        match method {
            MixMethod::Auto => TransitionMode::AutoLevel,
            MixMethod::Fade => TransitionMode::Fade,
            MixMethod::Smooth => TransitionMode::Smooth,
            MixMethod::Full => TransitionMode::Full,
            MixMethod::Scratch => TransitionMode::Scratch,
            MixMethod::Cue => TransitionMode::Cue,
        }
    }

    /// Whether this mode runs a dual-session gain ramp
    pub fn is_ramp(&self) -> bool {
        !matches!(self, TransitionMode::Cue)
    }

    /// Gains for the outgoing and incoming sessions at ramp progress `frac`
    ///
    /// `frac` is the normalized position in the transition, clamped to
    /// `[0, 1]`. Returns `(outgoing, incoming)` linear gains. `Cue` never
    /// ramps; it reports both sessions untouched.
    pub fn gains(&self, frac: f32) -> (f32, f32) {
        let frac = frac.clamp(0.0, 1.0);
        match self {
            TransitionMode::Fade => (1.0 - frac, frac),

            TransitionMode::Smooth => {
                // Raised cosine, 0..1, symmetric about frac = 0.5
                let curve = (1.0 - (frac * std::f32::consts::PI).cos()) / 2.0;
                (1.0 - curve, curve)
            }

            TransitionMode::Full => (1.0 - frac, 1.0),

            TransitionMode::Scratch => {
                if frac < 0.5 {
                    ((1.0 - 2.0 * frac).max(0.0), 0.0)
                } else {
                    (0.0, 1.0)
                }
            }

            TransitionMode::AutoLevel | TransitionMode::Cue => (1.0, 1.0),
        }
    }

    /// Gain the incoming session starts at, before the first tick
    pub fn initial_incoming_gain(&self) -> f32 {
        match self {
            TransitionMode::Full | TransitionMode::AutoLevel | TransitionMode::Cue => 1.0,
            TransitionMode::Fade | TransitionMode::Smooth | TransitionMode::Scratch => 0.0,
        }
    }
}

/// Step counter for one in-flight crossfade
///
/// Exists only while a ramp transition runs and is torn down exactly once.
/// `elapsed_steps` increases monotonically from 0 to `total_steps`
/// (always ≥ 1); the state is never reused for a second transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionState {
    mode: TransitionMode,
    elapsed_steps: u32,
    total_steps: u32,
}

impl TransitionState {
    /// Plan a transition of `duration` quantized to the tick interval
    pub fn new(mode: TransitionMode, duration: Duration) -> Self {
        let ms = duration.as_millis() as u64;
        let total_steps = ms.div_ceil(TICK_INTERVAL_MS).max(1) as u32;
        Self {
            mode,
            elapsed_steps: 0,
            total_steps,
        }
    }

    pub fn mode(&self) -> TransitionMode {
        self.mode
    }

    pub fn elapsed_steps(&self) -> u32 {
        self.elapsed_steps
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Advance one tick and return the new progress fraction
    pub fn advance(&mut self) -> f32 {
        self.elapsed_steps = (self.elapsed_steps + 1).min(self.total_steps);
        self.fraction()
    }

    /// Normalized progress in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        self.elapsed_steps as f32 / self.total_steps as f32
    }

    /// Whether this was the final tick
    pub fn is_complete(&self) -> bool {
        self.elapsed_steps >= self.total_steps
    }

    /// Whether the just-advanced tick was the first one
    pub fn is_first_step(&self) -> bool {
        self.elapsed_steps == 1
    }
}
