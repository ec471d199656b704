//! Cadence - Playback Transition Engine
//!
//! Platform-agnostic playback orchestration for Cadence.
//!
//! This crate provides:
//! - The [`PlaybackBackend`] trait that decode/output adapters implement
//! - Backend selection (primary vs. fallback decoder) by file extension
//! - The play queue with marker-skipping navigation
//! - The [`TransitionController`]: dual-session crossfades with selectable
//!   gain curves, cue transitions, and error recovery
//! - Trailing-silence analysis for auto-sized transitions
//!
//! # Architecture
//!
//! `cadence-playback` never touches a decoder or an audio device. Platform
//! code (see `cadence-audio-desktop`) supplies backends through the
//! [`BackendFactory`] seam and drives the controller from a single thread:
//! call [`TransitionController::tick`] every 100 ms, then drain
//! [`TransitionController::take_events`] and forward the [`PlayerEvent`]s to
//! the UI. All controller state is mutated on that one thread; there is no
//! internal locking.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::{MediaSource, PlayerSettings, QueueItem};
//! use cadence_playback::{BackendFactory, TransitionController};
//! # fn factory() -> Box<dyn BackendFactory> { unimplemented!() }
//!
//! let mut controller = TransitionController::new(factory(), PlayerSettings::default());
//! controller.set_queue(vec![
//!     QueueItem::track(MediaSource::Local("/music/a.mp3".into()), "A"),
//!     QueueItem::track(MediaSource::Local("/music/b.mp3".into()), "B"),
//! ]);
//! controller.load_at(0);
//!
//! loop {
//!     // every 100 ms:
//!     controller.tick();
//!     for event in controller.take_events() {
//!         println!("{event:?}");
//!     }
//! #   break;
//! }
//! ```

pub mod backend;
pub mod controller;
pub mod events;
pub mod queue;
pub mod selector;
pub mod silence;
pub mod transition;

pub use backend::{BackendEvent, BackendFactory, BackendKind, BackendState, PlaybackBackend};
pub use controller::TransitionController;
pub use events::{ErrorDecision, PlayerEvent};
pub use queue::QueueModel;
pub use selector::BackendSelector;
pub use transition::{TransitionMode, TransitionState, TICK_INTERVAL_MS};
