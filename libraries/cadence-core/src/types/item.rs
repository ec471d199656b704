//! Queue items and media sources

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Route under which the remote library serves raw audio
pub const SERVE_AUDIO_ROUTE: &str = "serve_audio";

/// Where a queue item's audio comes from
///
/// Remote entries carry the (host, route, path) triple the library server
/// hands out; the engine only ever assembles them into a URL, it never
/// invents or rewrites paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    /// File on the local filesystem
    Local(PathBuf),

    /// Entry served by a remote library
    Remote {
        /// Host (and optional port), e.g. `192.168.1.10:8080`
        host: String,
        /// Server route, normally [`SERVE_AUDIO_ROUTE`]
        route: String,
        /// Path of the entry relative to the route
        path: String,
    },
}

impl MediaSource {
    /// Remote source using the standard audio-serving route
    pub fn remote(host: impl Into<String>, path: impl Into<String>) -> Self {
        MediaSource::Remote {
            host: host.into(),
            route: SERVE_AUDIO_ROUTE.to_string(),
            path: path.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::Remote { .. })
    }

    /// Local filesystem path, if any
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            MediaSource::Local(path) => Some(path),
            MediaSource::Remote { .. } => None,
        }
    }

    /// Full URL for remote sources
    pub fn url(&self) -> Option<String> {
        match self {
            MediaSource::Local(_) => None,
            MediaSource::Remote { host, route, path } => {
                Some(format!("http://{host}/{route}/{path}"))
            }
        }
    }

    /// Lowercased file extension of the underlying path, if any
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            MediaSource::Local(path) => path.extension()?.to_str()?.to_string(),
            MediaSource::Remote { path, .. } => {
                Path::new(path).extension()?.to_str()?.to_string()
            }
        };
        Some(name.to_ascii_lowercase())
    }
}

/// What a queue entry represents
///
/// Only `Track` is directly playable. The browse/search layer expands the
/// reference kinds into tracks before they reach the engine; markers are
/// skipped during navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// A playable audio track
    Track,
    /// Album-art divider row inside a rendered queue
    AlbumCoverMarker,
    /// Reference to a playlist, to be expanded by the browse layer
    PlaylistRef,
    /// Reference to an artist, to be expanded by the browse layer
    ArtistRef,
    /// Reference to an album, to be expanded by the browse layer
    AlbumRef,
}

/// One entry in the play queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Entry kind; only `Track` is playable
    pub kind: ItemKind,

    /// Resolved audio source; always present for `Track` entries
    pub source: Option<MediaSource>,

    /// Human label, forwarded to the UI untouched
    pub display_text: String,
}

impl QueueItem {
    /// Playable track entry
    pub fn track(source: MediaSource, display_text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Track,
            source: Some(source),
            display_text: display_text.into(),
        }
    }

    /// Non-playable entry (marker or reference)
    pub fn marker(kind: ItemKind, display_text: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            display_text: display_text.into(),
        }
    }

    /// Whether the engine can hand this entry to a backend as-is
    pub fn is_playable(&self) -> bool {
        self.kind == ItemKind::Track && self.source.is_some()
    }

    pub fn is_remote(&self) -> bool {
        self.source.as_ref().is_some_and(MediaSource::is_remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_url_assembly() {
        let source = MediaSource::remote("10.0.0.2:8080", "albums/one/track.mp3");
        assert_eq!(
            source.url().as_deref(),
            Some("http://10.0.0.2:8080/serve_audio/albums/one/track.mp3")
        );
        assert!(source.is_remote());
        assert!(source.local_path().is_none());
    }

    #[test]
    fn extension_is_lowercased() {
        let local = MediaSource::Local(PathBuf::from("/music/Track.APE"));
        assert_eq!(local.extension().as_deref(), Some("ape"));

        let remote = MediaSource::remote("h", "dir/song.FLAC");
        assert_eq!(remote.extension().as_deref(), Some("flac"));
    }

    #[test]
    fn only_tracks_are_playable() {
        let track = QueueItem::track(MediaSource::Local(PathBuf::from("/a.mp3")), "A");
        assert!(track.is_playable());

        let cover = QueueItem::marker(ItemKind::AlbumCoverMarker, "Album Art");
        assert!(!cover.is_playable());

        let playlist = QueueItem::marker(ItemKind::PlaylistRef, "My Mix");
        assert!(!playlist.is_playable());
    }
}
