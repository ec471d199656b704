//! Playback thread runtime
//!
//! Owns the thread the whole engine lives on: backends, controller, and the
//! 100 ms tick all stay inside it, and only channel endpoints cross to the
//! UI. Commands go in, [`PlayerEvent`]s come out.

use crate::analyzer;
use crate::factory::DesktopBackendFactory;
use cadence_core::{MediaSource, MixMethod, PlayerSettings, QueueItem};
use cadence_playback::{ErrorDecision, PlayerEvent, TransitionController, TICK_INTERVAL_MS};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Commands accepted by the playback thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    SetQueue(Vec<QueueItem>),
    ClearQueue,
    LoadAt(usize),
    PlayPause,
    Next,
    Previous,
    Seek(Duration),
    SetMixMethod(MixMethod),
    SetTransitionDuration(f32),
    ResolveError(ErrorDecision),
    /// Analyzer result for the track that was current at spawn time
    AutoDurationReady { index: usize, seconds: f32 },
    Shutdown,
}

/// Handle to the playback thread
///
/// Dropping the player shuts the thread down cleanly.
pub struct Player {
    command_tx: Sender<PlayerCommand>,
    event_rx: Receiver<PlayerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Start the playback thread
    pub fn spawn(settings: PlayerSettings) -> cadence_core::Result<Self> {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        let analyzer_tx = command_tx.clone();
        let handle = thread::Builder::new()
            .name("cadence-playback".to_string())
            .spawn(move || run(settings, &command_rx, &event_tx, &analyzer_tx))?;

        Ok(Self {
            command_tx,
            event_rx,
            handle: Some(handle),
        })
    }

    /// Send a command; a dead playback thread makes this a no-op
    pub fn send(&self, command: PlayerCommand) {
        if self.command_tx.send(command).is_err() {
            debug!("playback thread is gone, dropping command");
        }
    }

    /// Event stream from the engine
    pub fn events(&self) -> &Receiver<PlayerEvent> {
        &self.event_rx
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.command_tx.send(PlayerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(
    settings: PlayerSettings,
    command_rx: &Receiver<PlayerCommand>,
    event_tx: &Sender<PlayerEvent>,
    analyzer_tx: &Sender<PlayerCommand>,
) {
    let factory = match DesktopBackendFactory::new() {
        Ok(factory) => factory,
        Err(err) => {
            let _ = event_tx.send(PlayerEvent::PlaybackError {
                kind: err.kind(),
                message: err.to_string(),
            });
            return;
        }
    };
    let mut controller = TransitionController::new(Box::new(factory), settings);

    let tick = Duration::from_millis(TICK_INTERVAL_MS);
    loop {
        match command_rx.recv_timeout(tick) {
            Ok(command) => {
                if handle_command(&mut controller, command) {
                    break;
                }
                while let Ok(command) = command_rx.try_recv() {
                    if handle_command(&mut controller, command) {
                        return;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        controller.tick();
        for event in controller.take_events() {
            maybe_spawn_analyzer(&controller, &event, analyzer_tx);
            if event_tx.send(event).is_err() {
                return;
            }
        }
    }
}

/// Apply one command; returns true on shutdown
fn handle_command(controller: &mut TransitionController, command: PlayerCommand) -> bool {
    match command {
        PlayerCommand::SetQueue(items) => controller.set_queue(items),
        PlayerCommand::ClearQueue => controller.clear_queue(),
        PlayerCommand::LoadAt(index) => controller.load_at(index),
        PlayerCommand::PlayPause => controller.play_pause(),
        PlayerCommand::Next => controller.next(),
        PlayerCommand::Previous => controller.previous(),
        PlayerCommand::Seek(position) => {
            if let Err(err) = controller.seek(position) {
                debug!(error = %err, "seek rejected");
            }
        }
        PlayerCommand::SetMixMethod(method) => controller.set_mix_method(method),
        PlayerCommand::SetTransitionDuration(seconds) => {
            controller.set_transition_duration(seconds);
        }
        PlayerCommand::ResolveError(decision) => controller.resolve_error(decision),
        PlayerCommand::AutoDurationReady { index, seconds } => {
            // stale results for tracks we've moved past are dropped
            if controller.current_index() == Some(index) {
                controller.set_auto_transition_duration(seconds);
            }
        }
        PlayerCommand::Shutdown => return true,
    }
    false
}

/// Kick off trailing-silence analysis for a freshly current local track
fn maybe_spawn_analyzer(
    controller: &TransitionController,
    event: &PlayerEvent,
    tx: &Sender<PlayerCommand>,
) {
    let PlayerEvent::TrackChanged { index } = event else {
        return;
    };
    if controller.settings().mix_method != MixMethod::Auto {
        return;
    }
    let Some(path) = controller
        .current_item()
        .and_then(|item| item.source.as_ref())
        .and_then(MediaSource::local_path)
    else {
        // remote tracks get their analysis from the serving side
        return;
    };

    let path = path.to_path_buf();
    let settings = controller.settings().clone();
    let index = *index;
    let tx = tx.clone();
    thread::spawn(move || match analyzer::analyze_file(&path, &settings) {
        Ok(seconds) => {
            let _ = tx.send(PlayerCommand::AutoDurationReady { index, seconds });
        }
        Err(err) => debug!(error = %err, path = %path.display(), "silence analysis failed"),
    });
}
