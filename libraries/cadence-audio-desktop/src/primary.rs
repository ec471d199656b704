//! Primary backend: rodio decode and output
//!
//! One `Sink` per loaded track on a shared output stream. Rodio's bundled
//! symphonia decoders cover the common formats well; known-problematic
//! lossless formats go through the fallback backend instead.

use crate::remote::{materialize, LocalMedia};
use cadence_core::{MediaSource, PlaybackError, Result};
use cadence_playback::{BackendEvent, BackendKind, BackendState, PlaybackBackend};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Rodio-based decode/output session
pub struct RodioBackend {
    // The stream must outlive every sink connected to it.
    stream: Rc<OutputStream>,
    sink: Option<Sink>,
    media: Option<LocalMedia>,
    duration: Option<Duration>,
    volume: f32,
    state: BackendState,
    ended: bool,
    pending: Vec<BackendEvent>,
}

impl RodioBackend {
    /// New idle session on an already-open output stream
    pub fn new(stream: Rc<OutputStream>) -> Self {
        Self {
            stream,
            sink: None,
            media: None,
            duration: None,
            volume: 1.0,
            state: BackendState::Idle,
            ended: false,
            pending: Vec::new(),
        }
    }
}

impl PlaybackBackend for RodioBackend {
    fn load(&mut self, source: &MediaSource) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }

        let media = materialize(source)?;
        let file = File::open(&media.path)
            .map_err(|e| PlaybackError::Load(format!("{}: {e}", media.path.display())))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::Decode(format!("{}: {e}", media.path.display())))?;

        let duration = decoder.total_duration();

        // created paused so the controller decides when audio starts
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(decoder);

        self.sink = Some(sink);
        self.media = Some(media);
        self.duration = duration;
        self.state = BackendState::Idle;
        self.ended = false;
        self.pending.clear();
        if let Some(duration) = duration {
            self.pending.push(BackendEvent::DurationChanged(duration));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let Some(sink) = self.sink.as_ref() else {
            return Err(PlaybackError::NotLoaded);
        };
        sink.play();
        self.state = BackendState::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
            self.state = BackendState::Paused;
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.media = None;
        self.duration = None;
        self.state = BackendState::Stopped;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let Some(sink) = self.sink.as_ref() else {
            return Err(PlaybackError::NotLoaded);
        };
        if sink.try_seek(position).is_err() {
            debug!(?position, "decoder refused the seek");
            return Err(PlaybackError::InvalidSeekPosition(position));
        }
        self.ended = false;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn set_volume(&mut self, gain: f32) {
        self.volume = gain.clamp(0.0, 1.0);
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(self.volume);
        }
    }

    fn state(&self) -> BackendState {
        self.state
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Primary
    }

    fn poll(&mut self) -> Vec<BackendEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if let Some(sink) = self.sink.as_ref() {
            if self.state == BackendState::Playing {
                events.push(BackendEvent::PositionChanged(sink.get_pos()));
                if sink.empty() && !self.ended {
                    self.ended = true;
                    self.state = BackendState::Stopped;
                    events.push(BackendEvent::StateChanged(BackendState::Stopped));
                    events.push(BackendEvent::Ended);
                }
            }
        }
        events
    }
}
