//! Offline decode for auto-transition analysis
//!
//! Decodes a track to mono f32 with symphonia and runs the trailing-silence
//! scan from `cadence-playback`. Runs on a worker thread per track; the
//! player applies the result only if the analyzed track is still current.

use cadence_core::{PlaybackError, PlayerSettings, Result};
use cadence_playback::silence::recommend_transition_duration;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Recommended transition duration (seconds) for the track at `path`
///
/// Decodes the whole file, downmixes to mono, and hands the samples to the
/// silence scan with the thresholds from `settings`.
pub fn analyze_file(path: &Path, settings: &PlayerSettings) -> Result<f32> {
    let samples = decode_mono(path)?;
    Ok(recommend_transition_duration(
        &samples.data,
        samples.sample_rate,
        settings.silence_threshold_db,
        settings.silence_min_duration_secs,
    ))
}

struct MonoSamples {
    data: Vec<f32>,
    sample_rate: u32,
}

fn decode_mono(path: &Path) -> Result<MonoSamples> {
    let file = File::open(path)
        .map_err(|e| PlaybackError::Load(format!("{}: {e}", path.display())))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Decode(format!("probe failed: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::Decode("no audio tracks found".to_string()))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("decoder init: {e}")))?;

    let mut data = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(PlaybackError::Decode(format!("packet read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // a corrupt packet mid-file is survivable
                debug!(error = %e, "skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let buf = sample_buf
            .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks_exact(channels) {
            data.push(frame.iter().sum::<f32>() / channels as f32);
        }
    }

    if data.is_empty() {
        return Err(PlaybackError::Decode(format!(
            "no decodable audio in {}",
            path.display()
        )));
    }

    Ok(MonoSamples { data, sample_rate })
}
