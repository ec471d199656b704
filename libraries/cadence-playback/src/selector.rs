//! Backend selection policy
//!
//! Pure extension-based dispatch between the primary and fallback decoders.
//! Remote items always use the primary backend: there is no local file to
//! quirk-check, and the serving side is assumed to transcode reliably.

use crate::backend::BackendKind;
use cadence_core::QueueItem;
use tracing::debug;

/// Extensions known to mis-decode on the primary backend
///
/// Mostly lossless or niche codecs where the primary pipeline produces
/// audible clicks from encoder padding / skip-samples.
pub const PROBLEMATIC_EXTENSIONS: &[&str] =
    &["ape", "wv", "tta", "tak", "ofr", "ofs", "shn", "mpp", "mpc"];

/// Maps a queue item to the backend that should play it
///
/// Deterministic and I/O-free: the same item always yields the same choice
/// for a given fallback availability.
#[derive(Debug, Clone, Copy)]
pub struct BackendSelector {
    fallback_available: bool,
}

impl BackendSelector {
    pub fn new(fallback_available: bool) -> Self {
        Self { fallback_available }
    }

    /// Pick the backend for an item
    ///
    /// When the fallback decoder is unavailable, problematic formats stay on
    /// the primary backend (logged degradation, never an error).
    pub fn select(&self, item: &QueueItem) -> BackendKind {
        if item.is_remote() {
            return BackendKind::Primary;
        }

        let Some(ext) = item.source.as_ref().and_then(|s| s.extension()) else {
            return BackendKind::Primary;
        };

        if PROBLEMATIC_EXTENSIONS.contains(&ext.as_str()) {
            if self.fallback_available {
                return BackendKind::Fallback;
            }
            debug!(
                extension = ext.as_str(),
                "fallback decoder unavailable, keeping problematic format on primary backend"
            );
        }

        BackendKind::Primary
    }
}
