//! Trailing-silence analysis for auto-sized transitions
//!
//! Scans the final seconds of a decoded track for the first sustained
//! low-energy point and recommends starting the transition there, so an
//! `Auto` transition covers exactly the quiet tail instead of cutting into
//! audible material. Pure math; the platform layer (see
//! `cadence-audio-desktop::analyzer`) supplies the decoded samples.

/// Analysis frame length in seconds
pub const FRAME_DURATION_SECS: f32 = 0.1;

/// Only the trailing window of a track is analyzed
pub const ANALYSIS_WINDOW_SECS: f32 = 10.0;

/// Smallest recommendation ever returned; guarantees at least one ramp step
pub const MIN_TRANSITION_SECS: f32 = 0.1;

/// Recommended transition duration from trailing-silence analysis
///
/// `samples` are mono f32 in `[-1, 1]`. The trailing
/// [`ANALYSIS_WINDOW_SECS`] (or the whole clip when shorter) is split into
/// fixed 100 ms frames; each frame's RMS level is converted to dBFS and the
/// scan returns `track_duration - offset` of the first run of at least
/// `min_quiet_secs` consecutive frames below `threshold_db`.
///
/// Falls back to [`MIN_TRANSITION_SECS`] when no such run exists or the
/// quiet point sits at/before the start of the clip, so the result is never
/// zero or negative.
pub fn recommend_transition_duration(
    samples: &[f32],
    sample_rate: u32,
    threshold_db: f32,
    min_quiet_secs: f32,
) -> f32 {
    if samples.is_empty() || sample_rate == 0 {
        return MIN_TRANSITION_SECS;
    }

    let rate = sample_rate as f32;
    let duration = samples.len() as f32 / rate;

    let start_sample = if duration < ANALYSIS_WINDOW_SECS {
        0
    } else {
        ((duration - ANALYSIS_WINDOW_SECS) * rate) as usize
    };
    let window = &samples[start_sample.min(samples.len())..];

    let frame_len = ((FRAME_DURATION_SECS * rate) as usize).max(1);
    let frames_needed = ((min_quiet_secs / FRAME_DURATION_SECS).ceil() as usize).max(1);

    let mut run_start: Option<usize> = None;
    let mut run_len = 0usize;
    let mut quiet_offset: Option<f32> = None;

    for (i, frame) in window.chunks(frame_len).enumerate() {
        if frame.is_empty() {
            continue;
        }

        let rms = (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt();
        let db = 20.0 * (rms + 1e-10).log10();

        if db < threshold_db {
            if run_start.is_none() {
                run_start = Some(i);
            }
            run_len += 1;
            if run_len >= frames_needed {
                let first = run_start.unwrap_or(i);
                quiet_offset =
                    Some((start_sample + first * frame_len) as f32 / rate);
                break;
            }
        } else {
            run_start = None;
            run_len = 0;
        }
    }

    match quiet_offset {
        Some(offset) if offset > 0.0 => (duration - offset).max(MIN_TRANSITION_SECS),
        _ => MIN_TRANSITION_SECS,
    }
}
