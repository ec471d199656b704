//! Desktop backend factory
//!
//! Opens the audio output once, probes for ffmpeg once, and hands
//! independent backend sessions to the transition controller. A missing
//! ffmpeg degrades fallback requests to the primary backend instead of
//! failing them.

use crate::fallback::FfmpegBackend;
use crate::primary::RodioBackend;
use cadence_core::{PlaybackError, Result};
use cadence_playback::{BackendFactory, BackendKind, PlaybackBackend};
use rodio::{OutputStream, OutputStreamBuilder};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::rc::Rc;
use tracing::{info, warn};

/// Override the ffmpeg binary used for fallback decoding
pub const FFMPEG_PATH_ENV: &str = "CADENCE_FFMPEG_PATH";

/// Locate a runnable ffmpeg, if any
fn probe_ffmpeg() -> Option<PathBuf> {
    let candidate = std::env::var_os(FFMPEG_PATH_ENV)
        .map_or_else(|| PathBuf::from("ffmpeg"), PathBuf::from);
    let runs = Command::new(&candidate)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    runs.then_some(candidate)
}

/// Factory for desktop backend sessions
///
/// All sinks share one output stream; the factory (and everything it
/// creates) stays on the playback thread.
pub struct DesktopBackendFactory {
    stream: Rc<OutputStream>,
    ffmpeg: Option<PathBuf>,
}

impl DesktopBackendFactory {
    /// Open the default audio output and probe for the fallback decoder
    pub fn new() -> Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::BackendUnavailable(format!("audio output: {e}")))?;

        let ffmpeg = probe_ffmpeg();
        match &ffmpeg {
            Some(path) => info!(path = %path.display(), "fallback decoder available"),
            None => info!("no ffmpeg found, fallback decoder disabled"),
        }

        Ok(Self {
            stream: Rc::new(stream),
            ffmpeg,
        })
    }
}

impl BackendFactory for DesktopBackendFactory {
    fn create(&self, kind: BackendKind) -> Result<Box<dyn PlaybackBackend>> {
        match kind {
            BackendKind::Primary => Ok(Box::new(RodioBackend::new(Rc::clone(&self.stream)))),
            BackendKind::Fallback => match &self.ffmpeg {
                Some(path) => Ok(Box::new(FfmpegBackend::new(
                    Rc::clone(&self.stream),
                    path.clone(),
                ))),
                None => {
                    warn!("fallback backend requested without ffmpeg, using primary");
                    Ok(Box::new(RodioBackend::new(Rc::clone(&self.stream))))
                }
            },
        }
    }

    fn fallback_available(&self) -> bool {
        self.ffmpeg.is_some()
    }
}
