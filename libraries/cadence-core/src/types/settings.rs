//! Player settings

use serde::{Deserialize, Serialize};

/// Bounds for the configured transition duration, in seconds
pub const TRANSITION_DURATION_RANGE: (f32, f32) = (1.0, 10.0);

/// How consecutive tracks are blended into each other
///
/// `Auto` computes a per-track transition duration from trailing-silence
/// analysis and runs the transition with both sessions at full volume; the
/// other variants use the configured duration with a fixed gain curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixMethod {
    /// Duration from silence analysis, no gain ramp
    Auto,
    /// Linear fade out / fade in
    Fade,
    /// Raised-cosine fade out / fade in
    Smooth,
    /// Incoming at full volume immediately, outgoing fades out
    Full,
    /// DJ-style hard cut with a short outgoing drop
    Scratch,
    /// No overlap: next track starts when the current one ends
    Cue,
}

impl MixMethod {
    /// Label shown in settings menus and the status line
    pub fn display_name(&self) -> &'static str {
        match self {
            MixMethod::Auto => "Auto",
            MixMethod::Fade => "Fade",
            MixMethod::Smooth => "Smooth",
            MixMethod::Full => "Full",
            MixMethod::Scratch => "Scratch",
            MixMethod::Cue => "Cue",
        }
    }
}

/// Engine configuration owned by the surrounding application
///
/// The engine reads a snapshot of these values at the moment a transition is
/// armed; changing them mid-transition only affects the next arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Selected transition style
    pub mix_method: MixMethod,

    /// Configured transition length in seconds (clamped to 1-10 on read)
    pub transition_duration_secs: f32,

    /// Frames quieter than this count as silence, in dBFS
    pub silence_threshold_db: f32,

    /// Minimum length of a quiet run for it to count, in seconds
    pub silence_min_duration_secs: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            mix_method: MixMethod::Auto,
            transition_duration_secs: 4.0,
            silence_threshold_db: -46.0,
            silence_min_duration_secs: 0.1,
        }
    }
}

impl PlayerSettings {
    /// Configured duration clamped into the supported 1-10 s range
    pub fn clamped_transition_duration(&self) -> f32 {
        let (min, max) = TRANSITION_DURATION_RANGE;
        self.transition_duration_secs.clamp(min, max)
    }
}
