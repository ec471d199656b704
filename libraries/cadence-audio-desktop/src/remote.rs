//! Remote media retrieval
//!
//! Remote queue items carry a URL assembled by the library server. Desktop
//! backends decode from local files, so a remote source is downloaded into a
//! temp file first; the file is removed when the session drops it.

use cadence_core::{MediaSource, PlaybackError, Result};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

/// A playable local path for any media source
///
/// The temp-file guard, when present, keeps a downloaded remote entry alive
/// for as long as the session needs it.
#[derive(Debug)]
pub struct LocalMedia {
    pub path: PathBuf,
    pub guard: Option<NamedTempFile>,
}

/// Resolve a source to a local file, downloading remote entries
pub fn materialize(source: &MediaSource) -> Result<LocalMedia> {
    match source {
        MediaSource::Local(path) => Ok(LocalMedia {
            path: path.clone(),
            guard: None,
        }),
        MediaSource::Remote { .. } => {
            let url = source
                .url()
                .ok_or_else(|| PlaybackError::Load("remote source without url".to_string()))?;
            let file = fetch(&url)?;
            debug!(url = url.as_str(), path = %file.path().display(), "downloaded remote track");
            Ok(LocalMedia {
                path: file.path().to_path_buf(),
                guard: Some(file),
            })
        }
    }
}

/// Download a URL into a fresh temp file
fn fetch(url: &str) -> Result<NamedTempFile> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(std::time::Duration::from_secs(5))
        .build();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| PlaybackError::Load(format!("fetch {url}: {e}")))?;
    let mut file = NamedTempFile::new()?;
    std::io::copy(&mut response.into_reader(), file.as_file_mut())?;
    Ok(file)
}
