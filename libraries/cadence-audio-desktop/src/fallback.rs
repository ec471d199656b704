//! Fallback backend: ffmpeg subprocess decode
//!
//! Some lossless formats (ape, wavpack, tta, ...) are decoded unreliably by
//! the primary path, so they go through an external `ffmpeg` process that
//! writes raw f32le PCM to stdout. A reader thread feeds the PCM into a
//! rodio sink in chunks; seeking restarts the process with `-ss`.
//!
//! Timing is coarse here: position and end-of-media refresh at ~200 ms, so
//! the controller only runs cue transitions on top of this backend.

use crate::remote::{materialize, LocalMedia};
use cadence_core::{ErrorKind, MediaSource, PlaybackError, Result};
use cadence_playback::{BackendEvent, BackendKind, BackendState, PlaybackBackend};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Fixed PCM format requested from ffmpeg
const OUTPUT_SAMPLE_RATE: u32 = 44_100;
const OUTPUT_CHANNELS: u16 = 2;

/// Position/end-of-media refresh granularity
const REFRESH_INTERVAL: Duration = Duration::from_millis(200);

/// Reader backpressure: stop reading ahead once this many PCM chunks queue
const MAX_QUEUED_CHUNKS: usize = 64;

/// ffmpeg arguments decoding `path` to raw f32le PCM on stdout
///
/// `offset` restarts decoding mid-file after a seek.
fn decode_args(path: &Path, offset: Duration) -> Vec<String> {
    let mut args = vec!["-v".to_string(), "error".to_string()];
    if !offset.is_zero() {
        args.push("-ss".to_string());
        args.push(format!("{:.3}", offset.as_secs_f64()));
    }
    args.extend([
        "-i".to_string(),
        path.display().to_string(),
        "-ac".to_string(),
        OUTPUT_CHANNELS.to_string(),
        "-ar".to_string(),
        OUTPUT_SAMPLE_RATE.to_string(),
        "-acodec".to_string(),
        "pcm_f32le".to_string(),
        "-f".to_string(),
        "f32le".to_string(),
        "-".to_string(),
    ]);
    args
}

/// Total duration of `media` according to ffprobe
fn probe_duration(ffprobe: &Path, media: &Path) -> Option<Duration> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(media)
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let secs: f64 = text.trim().parse().ok()?;
    Some(Duration::from_secs_f64(secs))
}

/// ffprobe lives next to ffmpeg in every common install
fn ffprobe_path(ffmpeg: &Path) -> PathBuf {
    match ffmpeg.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join("ffprobe"),
        _ => PathBuf::from("ffprobe"),
    }
}

/// Whether the reader should stay parked before appending more PCM
///
/// A shutdown request always releases a parked reader: a paused sink never
/// drains, so waiting on queue depth alone would never end.
fn backpressure_wait(queued: usize, stopping: bool) -> bool {
    !stopping && queued > MAX_QUEUED_CHUNKS
}

/// Feed decoded PCM from the ffmpeg pipe into the sink until EOF or stop
fn spawn_reader(
    mut stdout: ChildStdout,
    sink: Arc<Sink>,
    done: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buffer = vec![0u8; 16 * 1024];
        let mut carry: Vec<u8> = Vec::new();
        loop {
            while backpressure_wait(sink.len(), stop.load(Ordering::Acquire)) {
                thread::sleep(Duration::from_millis(50));
            }
            if stop.load(Ordering::Acquire) {
                break;
            }
            match stdout.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    carry.extend_from_slice(&buffer[..n]);
                    let usable = carry.len() - carry.len() % 4;
                    if usable == 0 {
                        continue;
                    }
                    let mut samples = Vec::with_capacity(usable / 4);
                    for bytes in carry[..usable].chunks_exact(4) {
                        samples.push(f32::from_le_bytes([
                            bytes[0], bytes[1], bytes[2], bytes[3],
                        ]));
                    }
                    carry.drain(..usable);
                    sink.append(SamplesBuffer::new(
                        OUTPUT_CHANNELS,
                        OUTPUT_SAMPLE_RATE,
                        samples,
                    ));
                }
                Err(err) => {
                    debug!(error = %err, "fallback pcm pipe read failed");
                    break;
                }
            }
        }
        done.store(true, Ordering::Release);
    })
}

/// The decode pipeline of one loaded track
struct Pipeline {
    child: Child,
    sink: Arc<Sink>,
    reader: Option<JoinHandle<()>>,
    reader_done: Arc<AtomicBool>,
    reader_stop: Arc<AtomicBool>,
    // position reported = offset + sink progress since (re)spawn
    base_offset: Duration,
}

impl Pipeline {
    fn shutdown(mut self) {
        // flag first and drain the sink before joining: the reader may be
        // parked on the backpressure loop with the sink paused, and a
        // paused sink never frees queue space on its own
        self.reader_stop.store(true, Ordering::Release);
        if let Err(err) = self.child.kill() {
            debug!(error = %err, "ffmpeg already gone");
        }
        let _ = self.child.wait();
        self.sink.stop();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// ffmpeg-subprocess decode/output session
pub struct FfmpegBackend {
    stream: Rc<OutputStream>,
    ffmpeg: PathBuf,
    pipeline: Option<Pipeline>,
    media: Option<LocalMedia>,
    duration: Option<Duration>,
    volume: f32,
    state: BackendState,
    ended: bool,
    last_refresh: Option<Instant>,
    pending: Vec<BackendEvent>,
}

impl FfmpegBackend {
    /// New idle session using the given ffmpeg binary
    pub fn new(stream: Rc<OutputStream>, ffmpeg: PathBuf) -> Self {
        Self {
            stream,
            ffmpeg,
            pipeline: None,
            media: None,
            duration: None,
            volume: 1.0,
            state: BackendState::Idle,
            ended: false,
            last_refresh: None,
            pending: Vec::new(),
        }
    }

    /// Spawn ffmpeg at `offset` and wire its PCM output into a fresh sink
    fn start_pipeline(&mut self, path: &Path, offset: Duration) -> Result<Pipeline> {
        let mut child = Command::new(&self.ffmpeg)
            .args(decode_args(path, offset))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::BackendUnavailable(format!("spawn ffmpeg: {e}")))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            PlaybackError::BackendUnavailable("ffmpeg stdout missing".to_string())
        })?;

        let sink = Arc::new(Sink::connect_new(self.stream.mixer()));
        sink.pause();
        sink.set_volume(self.volume);

        let reader_done = Arc::new(AtomicBool::new(false));
        let reader_stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(
            stdout,
            Arc::clone(&sink),
            Arc::clone(&reader_done),
            Arc::clone(&reader_stop),
        );

        Ok(Pipeline {
            child,
            sink,
            reader: Some(reader),
            reader_done,
            reader_stop,
            base_offset: offset,
        })
    }

    fn teardown_pipeline(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.shutdown();
        }
    }
}

impl PlaybackBackend for FfmpegBackend {
    fn load(&mut self, source: &MediaSource) -> Result<()> {
        self.teardown_pipeline();

        let media = materialize(source)?;
        if !media.path.exists() {
            return Err(PlaybackError::Load(format!(
                "no such file: {}",
                media.path.display()
            )));
        }

        let duration = probe_duration(&ffprobe_path(&self.ffmpeg), &media.path);
        if duration.is_none() {
            warn!(path = %media.path.display(), "ffprobe gave no duration, end-of-track arming disabled");
        }

        let pipeline = self.start_pipeline(&media.path, Duration::ZERO)?;

        self.pipeline = Some(pipeline);
        self.media = Some(media);
        self.duration = duration;
        self.state = BackendState::Idle;
        self.ended = false;
        self.last_refresh = None;
        self.pending.clear();
        if let Some(duration) = duration {
            self.pending.push(BackendEvent::DurationChanged(duration));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return Err(PlaybackError::NotLoaded);
        };
        pipeline.sink.play();
        self.state = BackendState::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(pipeline) = self.pipeline.as_ref() {
            pipeline.sink.pause();
            self.state = BackendState::Paused;
        }
    }

    fn stop(&mut self) {
        self.teardown_pipeline();
        self.media = None;
        self.duration = None;
        self.state = BackendState::Stopped;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let Some(path) = self.media.as_ref().map(|m| m.path.clone()) else {
            return Err(PlaybackError::NotLoaded);
        };
        if let Some(duration) = self.duration {
            if position > duration {
                return Err(PlaybackError::InvalidSeekPosition(position));
            }
        }

        // no in-stream seeking over a pipe: restart ffmpeg at the offset
        let was_playing = self.state == BackendState::Playing;
        self.teardown_pipeline();
        let pipeline = self.start_pipeline(&path, position)?;
        if was_playing {
            pipeline.sink.play();
        }
        self.pipeline = Some(pipeline);
        self.ended = false;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.pipeline
            .as_ref()
            .map_or(Duration::ZERO, |p| p.base_offset + p.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn set_volume(&mut self, gain: f32) {
        self.volume = gain.clamp(0.0, 1.0);
        if let Some(pipeline) = self.pipeline.as_ref() {
            pipeline.sink.set_volume(self.volume);
        }
    }

    fn state(&self) -> BackendState {
        self.state
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn poll(&mut self) -> Vec<BackendEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.state != BackendState::Playing || self.ended {
            return events;
        }

        let now = Instant::now();
        let due = self
            .last_refresh
            .map_or(true, |t| now.duration_since(t) >= REFRESH_INTERVAL);
        if !due {
            return events;
        }
        self.last_refresh = Some(now);

        // a decoder crash surfaces as a failed exit status
        let mut failed = None;
        if let Some(pipeline) = self.pipeline.as_mut() {
            if let Ok(Some(status)) = pipeline.child.try_wait() {
                if !status.success() {
                    failed = Some(format!("ffmpeg exited with {status}"));
                }
            }
        }
        if let Some(message) = failed {
            self.ended = true;
            self.state = BackendState::Errored;
            events.push(BackendEvent::Error {
                kind: ErrorKind::Decode,
                message,
            });
            return events;
        }

        if let Some(pipeline) = self.pipeline.as_ref() {
            events.push(BackendEvent::PositionChanged(
                pipeline.base_offset + pipeline.sink.get_pos(),
            ));
            let drained =
                pipeline.reader_done.load(Ordering::Acquire) && pipeline.sink.empty();
            if drained {
                self.ended = true;
                self.state = BackendState::Stopped;
                events.push(BackendEvent::StateChanged(BackendState::Stopped));
                events.push(BackendEvent::Ended);
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_args_request_raw_pcm() {
        let args = decode_args(Path::new("/music/a.ape"), Duration::ZERO);
        assert!(!args.contains(&"-ss".to_string()));
        let joined = args.join(" ");
        assert!(joined.contains("-i /music/a.ape"));
        assert!(joined.contains("-acodec pcm_f32le"));
        assert!(joined.ends_with("-f f32le -"));
    }

    #[test]
    fn decode_args_seek_offset() {
        let args = decode_args(Path::new("/music/a.ape"), Duration::from_millis(12_500));
        let pos = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[pos + 1], "12.500");
        // -ss must precede -i for input-side seeking
        assert!(pos < args.iter().position(|a| a == "-i").unwrap());
    }

    #[test]
    fn stop_request_releases_a_parked_reader() {
        // a full queue parks the reader while playing...
        assert!(backpressure_wait(MAX_QUEUED_CHUNKS + 1, false));
        // ...but shutdown must win even with the queue full and the sink
        // paused, or teardown joins a thread that never wakes
        assert!(!backpressure_wait(MAX_QUEUED_CHUNKS + 1, true));
        assert!(!backpressure_wait(0, false));
    }

    #[test]
    fn ffprobe_sits_next_to_ffmpeg() {
        assert_eq!(
            ffprobe_path(Path::new("/opt/av/bin/ffmpeg")),
            PathBuf::from("/opt/av/bin/ffprobe")
        );
        assert_eq!(ffprobe_path(Path::new("ffmpeg")), PathBuf::from("ffprobe"));
    }
}
