//! Cadence - Desktop Audio Layer
//!
//! Platform backends and the playback runtime for desktop targets:
//! - [`RodioBackend`]: the primary decode/output path (symphonia via rodio)
//! - [`FfmpegBackend`]: fallback decoder for formats the primary mis-handles,
//!   piping PCM out of an `ffmpeg` subprocess
//! - [`DesktopBackendFactory`]: probes what is available and hands backends
//!   to the transition controller
//! - [`Player`]: owns the playback thread, ticking the controller every
//!   100 ms and exchanging commands/events over channels
//! - [`analyzer`]: offline trailing-silence analysis for Auto transitions

pub mod analyzer;
pub mod factory;
pub mod fallback;
pub mod player;
pub mod primary;
pub mod remote;

pub use factory::DesktopBackendFactory;
pub use fallback::FfmpegBackend;
pub use player::{Player, PlayerCommand};
pub use primary::RodioBackend;
