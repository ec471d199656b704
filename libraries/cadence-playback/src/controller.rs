//! Transition controller - core orchestration
//!
//! Owns the active playback session, decides when a transition should begin,
//! runs the timed volume-interpolation loop against a second session, and
//! promotes the incoming session to active when the ramp completes.
//!
//! Exactly two session slots exist: `active` and the incoming session inside
//! the in-flight crossfade. The outgoing session is stopped and dropped only
//! after its slot has been handed over, so no callback can observe a
//! half-torn-down session. All methods run on the host's single playback
//! thread; [`tick`](TransitionController::tick) is expected every 100 ms.

use crate::backend::{BackendEvent, BackendFactory, BackendKind, PlaybackBackend};
use crate::events::{ErrorDecision, PlayerEvent};
use crate::queue::QueueModel;
use crate::selector::BackendSelector;
use crate::silence::MIN_TRANSITION_SECS;
use crate::transition::{TransitionMode, TransitionState, SCRATCH_CUE_OFFSET};
use cadence_core::{
    ErrorKind, MediaSource, MixMethod, PlaybackError, PlaybackState, PlayerSettings, QueueItem,
    Result,
};
use std::time::Duration;
use tracing::{debug, warn};

/// One live backend bound to one queue item
struct Session {
    backend: Box<dyn PlaybackBackend>,
    kind: BackendKind,
    index: usize,
}

/// An in-flight dual-session transition
///
/// Exclusively owns the incoming session until promotion or abort.
struct Crossfade {
    state: TransitionState,
    incoming: Session,
}

/// Central playback orchestration
///
/// Drives the session lifecycle: queue navigation, backend selection,
/// transition arming and stepping, and the error-recovery decision points.
/// Events for the UI accumulate internally and are drained with
/// [`take_events`](Self::take_events).
pub struct TransitionController {
    factory: Box<dyn BackendFactory>,
    selector: BackendSelector,
    queue: QueueModel,
    settings: PlayerSettings,
    state: PlaybackState,

    // The two session slots
    active: Option<Session>,
    crossfade: Option<Crossfade>,

    // Armed-but-not-started cue transition
    cued_next: Option<usize>,

    // Arming guard: set once per approach to end-of-track, cleared on
    // promotion, natural end, or seek-back disarm
    mixing_next: bool,

    // Broken incoming track to skip past at the current track's natural end
    skip_after_end: Option<usize>,

    // Analyzer-supplied per-track duration for Auto mode
    auto_duration: Option<Duration>,

    // Last known position/duration of the active session
    position: Duration,
    duration: Option<Duration>,

    // Event queue for the host
    pending_events: Vec<PlayerEvent>,
}

impl TransitionController {
    /// Create a controller around a platform backend factory
    pub fn new(factory: Box<dyn BackendFactory>, settings: PlayerSettings) -> Self {
        let selector = BackendSelector::new(factory.fallback_available());
        Self {
            factory,
            selector,
            queue: QueueModel::new(),
            settings,
            state: PlaybackState::Idle,
            active: None,
            crossfade: None,
            cued_next: None,
            mixing_next: false,
            skip_after_end: None,
            auto_duration: None,
            position: Duration::ZERO,
            duration: None,
            pending_events: Vec::new(),
        }
    }

    // ===== Commands =====

    /// Replace the queue contents
    ///
    /// Stops any current playback; the new queue starts unloaded.
    pub fn set_queue(&mut self, items: Vec<QueueItem>) {
        self.teardown_sessions();
        self.queue.set_items(items);
        self.set_state(PlaybackState::Idle);
    }

    /// Clear the queue and return to idle
    pub fn clear_queue(&mut self) {
        self.teardown_sessions();
        self.queue.clear();
        self.set_state(PlaybackState::Idle);
    }

    /// Load and play the item at `index`
    ///
    /// A non-track entry resolves forward to the nearest following track;
    /// if none exists the engine goes idle and reports queue exhaustion.
    pub fn load_at(&mut self, index: usize) {
        match self.queue.resolve_load_target(index) {
            Some(target) => self.load_index(target),
            None => self.finish_queue(),
        }
    }

    /// Toggle play/pause; from idle, starts the first playable item
    pub fn play_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                if let Some(session) = self.active.as_mut() {
                    session.backend.pause();
                }
                if let Some(cf) = self.crossfade.as_mut() {
                    cf.incoming.backend.pause();
                }
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Paused => {
                let mut failure: Option<PlaybackError> = None;
                if let Some(session) = self.active.as_mut() {
                    if let Err(err) = session.backend.play() {
                        failure = Some(err);
                    }
                }
                if let Some(cf) = self.crossfade.as_mut() {
                    if let Err(err) = cf.incoming.backend.play() {
                        debug!(error = %err, "incoming session failed to resume");
                    }
                }
                match failure {
                    Some(err) => self.enter_errored(err.kind(), err.to_string()),
                    None => self.set_state(PlaybackState::Playing),
                }
            }
            PlaybackState::Idle | PlaybackState::Stopped => {
                let start = self.queue.cursor().or_else(|| self.queue.resolve_load_target(0));
                if let Some(index) = start {
                    self.load_at(index);
                }
            }
            PlaybackState::Errored => {}
        }
    }

    /// Skip to the next playable item; a no-op past the end of the queue
    pub fn next(&mut self) {
        if self.state == PlaybackState::Errored {
            return;
        }
        self.disarm();
        match self.queue.next_playable_after(self.queue.cursor()) {
            Some(index) => self.load_index(index),
            None => debug!("next past the last playable item, ignoring"),
        }
    }

    /// Skip to the previous playable item; a no-op before the start
    pub fn previous(&mut self) {
        if self.state == PlaybackState::Errored {
            return;
        }
        self.disarm();
        match self.queue.previous_playable_before(self.queue.cursor()) {
            Some(index) => self.load_index(index),
            None => debug!("previous past the first playable item, ignoring"),
        }
    }

    /// Seek within the active track
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        let Some(session) = self.active.as_mut() else {
            return Err(PlaybackError::NotLoaded);
        };
        session.backend.seek(position)?;
        self.position = position;
        Ok(())
    }

    /// Change the mix method; takes effect at the next transition arm
    pub fn set_mix_method(&mut self, method: MixMethod) {
        self.settings.mix_method = method;
    }

    /// Change the configured transition duration (seconds, clamped 1-10 on
    /// read); takes effect at the next transition arm
    pub fn set_transition_duration(&mut self, seconds: f32) {
        self.settings.transition_duration_secs = seconds;
    }

    /// Per-track transition duration for Auto mode
    ///
    /// Supplied by the host after trailing-silence analysis of the current
    /// track (or forwarded from a server-computed value for remote tracks).
    /// Cleared automatically whenever the active track changes.
    pub fn set_auto_transition_duration(&mut self, seconds: f32) {
        self.auto_duration = Some(Duration::from_secs_f32(seconds.max(MIN_TRANSITION_SECS)));
    }

    /// Answer a pending [`PlayerEvent::PlaybackError`]
    pub fn resolve_error(&mut self, decision: ErrorDecision) {
        if self.state != PlaybackState::Errored {
            return;
        }
        match decision {
            ErrorDecision::Continue => match self.queue.next_playable_after(self.queue.cursor()) {
                Some(index) => self.load_index(index),
                None => self.finish_queue(),
            },
            ErrorDecision::Stop => {
                self.teardown_sessions();
                self.queue.clear();
                self.set_state(PlaybackState::Idle);
            }
        }
    }

    // ===== Tick =====

    /// Advance the engine by one 100 ms tick
    ///
    /// Polls both sessions' backends, runs their events through the state
    /// machine, and steps any in-flight gain ramp.
    pub fn tick(&mut self) {
        if let Some(events) = self.active.as_mut().map(|s| s.backend.poll()) {
            for event in events {
                // an event that replaces the session invalidates the rest
                // of this batch; they belong to the retired backend
                if self.handle_active_event(event) {
                    break;
                }
            }
        }

        if let Some(cf) = self.crossfade.as_mut() {
            let mut failure: Option<String> = None;
            for event in cf.incoming.backend.poll() {
                if let BackendEvent::Error { message, .. } = event {
                    failure = Some(message);
                }
            }
            if let Some(message) = failure {
                self.abort_transition(&message);
            }
        }

        self.step_transition();
    }

    /// Drain pending events for the host
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== State queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &QueueModel {
        &self.queue
    }

    /// Queue index of the active track
    pub fn current_index(&self) -> Option<usize> {
        self.active.as_ref().map(|s| s.index).or_else(|| self.queue.cursor())
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.queue.cursor().and_then(|i| self.queue.item(i))
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Whether a dual-session ramp is currently running
    pub fn is_transitioning(&self) -> bool {
        self.crossfade.is_some()
    }

    /// Last known position of the active session
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Last known duration of the active session
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    // ===== Event handling =====

    /// Returns true when the event replaced or tore down the active session
    fn handle_active_event(&mut self, event: BackendEvent) -> bool {
        match event {
            BackendEvent::PositionChanged(position) => {
                self.position = position;
                let duration_ms = self.duration.map_or(0, |d| d.as_millis() as u64);
                self.emit(PlayerEvent::PositionTick {
                    position_ms: position.as_millis() as u64,
                    duration_ms,
                });
                self.update_arming(position);
                false
            }
            BackendEvent::DurationChanged(duration) => {
                self.duration = Some(duration);
                false
            }
            BackendEvent::StateChanged(state) => {
                debug!(?state, "active backend state changed");
                false
            }
            BackendEvent::Ended => self.handle_ended(),
            BackendEvent::Error { kind, message } => {
                self.enter_errored(kind, message);
                true
            }
        }
    }

    /// End of the active track; returns true when the session was replaced
    fn handle_ended(&mut self) -> bool {
        if self.crossfade.is_some() {
            // the outgoing track ran out a little before the final tick;
            // promotion happens when the ramp completes
            debug!("outgoing session ended mid-transition");
            return false;
        }

        if let Some(next) = self.cued_next.take() {
            self.mixing_next = false;
            self.load_index(next);
            return true;
        }

        let from = self.skip_after_end.take().or_else(|| self.queue.cursor());
        self.mixing_next = false;
        match self.queue.next_playable_after(from) {
            Some(index) => self.load_index(index),
            None => self.finish_queue(),
        }
        true
    }

    // ===== Transition arming and stepping =====

    /// Re-evaluate the arming condition on a position update
    fn update_arming(&mut self, position: Duration) {
        if self.state != PlaybackState::Playing
            || self.crossfade.is_some()
            || self.skip_after_end.is_some()
        {
            return;
        }
        let Some(duration) = self.duration else {
            return;
        };
        if duration.is_zero() {
            return;
        }

        let threshold = self.armed_duration();
        let remaining = duration.saturating_sub(position);

        if remaining <= threshold {
            if !self.mixing_next {
                if let Some(next) = self.queue.next_playable_after(self.queue.cursor()) {
                    self.mixing_next = true;
                    self.arm_transition(next, threshold);
                }
            }
        } else if self.mixing_next {
            // seeked back above the threshold before the cue fired
            self.mixing_next = false;
            self.cued_next = None;
        }
    }

    /// Transition duration snapshot taken at arm time
    fn armed_duration(&self) -> Duration {
        if self.settings.mix_method == MixMethod::Auto {
            if let Some(duration) = self.auto_duration {
                return duration;
            }
        }
        Duration::from_secs_f32(self.settings.clamped_transition_duration())
    }

    /// Start a transition toward `next_index`
    fn arm_transition(&mut self, next_index: usize, duration: Duration) {
        let mode = TransitionMode::from_mix_method(self.settings.mix_method);

        let Some(next_item) = self.queue.item(next_index).cloned() else {
            self.mixing_next = false;
            return;
        };

        // The fallback backend's coarse timing makes gain interpolation
        // unreliable, so transitions from or into a fallback session are
        // degraded to cue behavior.
        let from_fallback = self
            .active
            .as_ref()
            .is_some_and(|s| s.kind == BackendKind::Fallback);
        let to_fallback = self.selector.select(&next_item) == BackendKind::Fallback;

        if !mode.is_ramp() || from_fallback || to_fallback {
            if mode.is_ramp() {
                debug!(next_index, "fallback-backed session, degrading transition to cue");
            }
            self.cued_next = Some(next_index);
            return;
        }

        let Some(source) = next_item.source.clone() else {
            // playable items always carry a source; cue defensively
            warn!(next_index, "playable item without source, degrading to cue");
            self.cued_next = Some(next_index);
            return;
        };

        match self.create_incoming(next_index, &source, mode) {
            Ok(incoming) => {
                self.crossfade = Some(Crossfade {
                    state: TransitionState::new(mode, duration),
                    incoming,
                });
            }
            Err(err) => {
                warn!(error = %err, next_index, "incoming session failed to start, scheduling skip");
                self.skip_after_end = Some(next_index);
            }
        }
    }

    /// Step the in-flight ramp by one tick
    fn step_transition(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(cf) = self.crossfade.as_mut() else {
            return;
        };

        let frac = cf.state.advance();
        let mode = cf.state.mode();

        if mode == TransitionMode::Scratch && cf.state.is_first_step() {
            if let Err(err) = cf.incoming.backend.seek(SCRATCH_CUE_OFFSET) {
                debug!(error = %err, "scratch cue seek failed");
            }
        }

        let (outgoing_gain, incoming_gain) = mode.gains(frac);
        cf.incoming.backend.set_volume(incoming_gain);
        let complete = cf.state.is_complete();

        if let Some(active) = self.active.as_mut() {
            active.backend.set_volume(outgoing_gain);
        }

        self.emit(PlayerEvent::TransitionProgress { fraction: frac });

        if complete {
            self.finish_transition();
        }
    }

    /// Final tick: retire the outgoing session, promote the incoming one
    fn finish_transition(&mut self) {
        let Some(cf) = self.crossfade.take() else {
            return;
        };

        if let Some(mut outgoing) = self.active.take() {
            outgoing.backend.stop();
        }

        let index = cf.incoming.index;
        self.active = Some(cf.incoming);
        self.queue.set_cursor(Some(index));
        self.mixing_next = false;
        self.auto_duration = None;

        if let Some(active) = self.active.as_ref() {
            self.position = active.backend.position();
            self.duration = active.backend.duration();
        }

        self.emit(PlayerEvent::TrackChanged { index });
    }

    /// Incoming session failed before promotion: keep the outgoing track
    /// playing and skip the broken item at its natural end
    fn abort_transition(&mut self, message: &str) {
        let Some(mut cf) = self.crossfade.take() else {
            return;
        };
        cf.incoming.backend.stop();
        warn!(
            next_index = cf.incoming.index,
            message, "incoming session failed mid-transition, keeping outgoing track"
        );

        if let Some(active) = self.active.as_mut() {
            active.backend.set_volume(1.0);
        }
        // mixing_next stays set so the broken item is not re-armed
        self.skip_after_end = Some(cf.incoming.index);
    }

    // ===== Session lifecycle =====

    /// Load and play the playable item at `index`, replacing all sessions
    fn load_index(&mut self, index: usize) {
        self.teardown_sessions();

        let Some(item) = self.queue.item(index).cloned() else {
            self.finish_queue();
            return;
        };
        let Some(source) = item.source.clone() else {
            self.finish_queue();
            return;
        };

        let kind = self.selector.select(&item);
        match self.create_session(kind, index, &source) {
            Ok(session) => {
                self.active = Some(session);
                self.queue.set_cursor(Some(index));
                self.position = Duration::ZERO;
                self.duration = None;
                self.auto_duration = None;
                self.emit(PlayerEvent::TrackChanged { index });
                self.set_state(PlaybackState::Playing);
            }
            Err(err) => {
                // park on the broken item so a Continue decision advances
                // past it
                self.queue.set_cursor(Some(index));
                self.enter_errored(err.kind(), err.to_string());
            }
        }
    }

    /// Create, load, and start the active session at full volume
    fn create_session(
        &self,
        kind: BackendKind,
        index: usize,
        source: &MediaSource,
    ) -> Result<Session> {
        let mut backend = self.factory.create(kind)?;
        backend.load(source)?;
        backend.set_volume(1.0);
        backend.play()?;
        let kind = backend.kind();
        Ok(Session {
            backend,
            kind,
            index,
        })
    }

    /// Create, load, and start the incoming session at the mode's start gain
    ///
    /// Incoming sessions are always primary: fallback-bound items never
    /// reach this path (they are degraded to cue at arm time).
    fn create_incoming(
        &self,
        index: usize,
        source: &MediaSource,
        mode: TransitionMode,
    ) -> Result<Session> {
        let mut backend = self.factory.create(BackendKind::Primary)?;
        backend.load(source)?;
        backend.set_volume(mode.initial_incoming_gain());
        backend.play()?;
        let kind = backend.kind();
        Ok(Session {
            backend,
            kind,
            index,
        })
    }

    /// Stop and drop both sessions and every armed-transition flag
    fn teardown_sessions(&mut self) {
        if let Some(mut cf) = self.crossfade.take() {
            cf.incoming.backend.stop();
        }
        self.cued_next = None;
        self.mixing_next = false;
        self.skip_after_end = None;
        self.auto_duration = None;
        if let Some(mut session) = self.active.take() {
            session.backend.stop();
        }
        self.position = Duration::ZERO;
        self.duration = None;
    }

    /// Disarm an armed-but-not-started transition before navigation
    fn disarm(&mut self) {
        self.cued_next = None;
        if self.crossfade.is_none() {
            self.mixing_next = false;
        }
    }

    /// No playable item remains: normal terminal state, not an error
    fn finish_queue(&mut self) {
        self.teardown_sessions();
        self.set_state(PlaybackState::Idle);
        self.emit(PlayerEvent::QueueExhausted);
    }

    /// Park on an error and wait for the caller's continue/stop decision
    fn enter_errored(&mut self, kind: ErrorKind, message: String) {
        if let Some(mut cf) = self.crossfade.take() {
            cf.incoming.backend.stop();
        }
        self.cued_next = None;
        self.mixing_next = false;
        self.skip_after_end = None;
        if let Some(mut session) = self.active.take() {
            session.backend.stop();
        }
        self.emit(PlayerEvent::PlaybackError { kind, message });
        self.set_state(PlaybackState::Errored);
    }

    // ===== Event helpers =====

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.emit(PlayerEvent::PlaybackStateChanged { state });
        }
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.pending_events.push(event);
    }
}
