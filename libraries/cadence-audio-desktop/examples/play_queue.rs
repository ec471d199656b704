//! Play files from the command line with crossfade transitions
//!
//! ```sh
//! cargo run --example play_queue -- a.mp3 b.flac c.ape
//! RUST_LOG=cadence_playback=debug cargo run --example play_queue -- *.mp3
//! ```

use cadence_audio_desktop::{Player, PlayerCommand};
use cadence_core::{MediaSource, PlayerSettings, QueueItem};
use cadence_playback::PlayerEvent;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let items: Vec<QueueItem> = std::env::args()
        .skip(1)
        .map(|arg| {
            let display = arg.clone();
            QueueItem::track(MediaSource::Local(PathBuf::from(arg)), display)
        })
        .collect();
    if items.is_empty() {
        eprintln!("usage: play_queue <file> [file...]");
        std::process::exit(2);
    }

    let settings = PlayerSettings::default();
    println!("mix method: {}", settings.mix_method.display_name());
    let player = Player::spawn(settings)?;
    player.send(PlayerCommand::SetQueue(items));
    player.send(PlayerCommand::LoadAt(0));

    for event in player.events() {
        match event {
            PlayerEvent::TrackChanged { index } => println!("track {index}"),
            PlayerEvent::PositionTick {
                position_ms,
                duration_ms,
            } => {
                print!("\r{:>6.1}s / {:>6.1}s", position_ms as f64 / 1000.0, duration_ms as f64 / 1000.0);
            }
            PlayerEvent::TransitionProgress { fraction } => {
                print!("\rtransition {:>3.0}%", fraction * 100.0);
            }
            PlayerEvent::PlaybackStateChanged { state } => println!("\nstate: {state:?}"),
            PlayerEvent::PlaybackError { kind, message } => {
                eprintln!("\nerror ({kind:?}): {message}");
                player.send(PlayerCommand::ResolveError(
                    cadence_playback::ErrorDecision::Continue,
                ));
            }
            PlayerEvent::QueueExhausted => {
                println!("\ndone");
                break;
            }
        }
    }
    Ok(())
}
