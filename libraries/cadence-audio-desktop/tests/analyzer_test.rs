//! Integration tests for the trailing-silence analyzer
//!
//! Generates real WAV files with hound and checks the recommended
//! transition durations end to end through the symphonia decode path.

use cadence_audio_desktop::analyzer::analyze_file;
use cadence_core::PlayerSettings;
use std::io::Write;
use std::path::PathBuf;

const SAMPLE_RATE: u32 = 44_100;

/// Write `segments` of (seconds, amplitude) as a mono 16-bit WAV
fn write_wav(dir: &tempfile::TempDir, name: &str, segments: &[(f32, f32)]) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &(secs, amplitude) in segments {
        let n = (secs * SAMPLE_RATE as f32) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let sample = amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            writer.write_sample((sample * f32::from(i16::MAX)) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn silent_tail_recommends_matching_duration() {
    let dir = tempfile::tempdir().unwrap();
    // 12 s track, silent for the last 2 s
    let path = write_wav(&dir, "tail.wav", &[(10.0, 0.8), (2.0, 0.0)]);

    let secs = analyze_file(&path, &PlayerSettings::default()).unwrap();
    assert!((1.8..=2.2).contains(&secs), "expected ~2.0s, got {secs}");
}

#[test]
fn loud_to_the_end_recommends_the_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(&dir, "loud.wav", &[(11.0, 0.8)]);

    let secs = analyze_file(&path, &PlayerSettings::default()).unwrap();
    assert!(secs > 0.0);
    assert!(secs <= 0.2, "expected the minimum fallback, got {secs}");
}

#[test]
fn custom_threshold_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    // the tail is quiet but not silent: below -46 dBFS only barely
    let path = write_wav(&dir, "quiet.wav", &[(10.0, 0.8), (2.0, 0.002)]);

    let default = analyze_file(&path, &PlayerSettings::default()).unwrap();
    assert!((1.8..=2.2).contains(&default), "got {default}");

    // a stricter threshold no longer counts that tail as silence
    let strict = PlayerSettings {
        silence_threshold_db: -70.0,
        ..PlayerSettings::default()
    };
    let secs = analyze_file(&path, &strict).unwrap();
    assert!(secs <= 0.2, "got {secs}");
}

#[test]
fn garbage_input_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.wav");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"not a wav file at all")
        .unwrap();

    assert!(analyze_file(&path, &PlayerSettings::default()).is_err());
}

#[test]
fn missing_file_is_a_load_error() {
    let path = PathBuf::from("/nonexistent/cadence/track.wav");
    let err = analyze_file(&path, &PlayerSettings::default()).unwrap_err();
    assert!(matches!(err, cadence_core::PlaybackError::Load(_)));
}
