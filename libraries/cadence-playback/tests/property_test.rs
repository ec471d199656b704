//! Property-based tests for transition curves and queue navigation
//!
//! Uses proptest to verify invariants across many random inputs.

use cadence_core::{ItemKind, MediaSource, QueueItem};
use cadence_playback::{QueueModel, TransitionMode, TransitionState};
use proptest::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

const MODES: [TransitionMode; 6] = [
    TransitionMode::Fade,
    TransitionMode::Smooth,
    TransitionMode::Full,
    TransitionMode::Scratch,
    TransitionMode::AutoLevel,
    TransitionMode::Cue,
];

fn arbitrary_mode() -> impl Strategy<Value = TransitionMode> {
    prop::sample::select(&MODES[..])
}

fn arbitrary_items() -> impl Strategy<Value = Vec<QueueItem>> {
    prop::collection::vec(
        prop_oneof![
            "[a-z]{1,8}\\.(mp3|flac|ape)".prop_map(|name| QueueItem::track(
                MediaSource::Local(PathBuf::from(format!("/music/{name}"))),
                &name,
            )),
            Just(QueueItem::marker(ItemKind::AlbumCoverMarker, "cover")),
        ],
        0..30,
    )
}

proptest! {
    /// Gains are always finite and inside [0, 1] for any input fraction
    #[test]
    fn gains_are_bounded(mode in arbitrary_mode(), frac in -2.0f32..3.0) {
        let (outgoing, incoming) = mode.gains(frac);
        prop_assert!(outgoing.is_finite() && incoming.is_finite());
        prop_assert!((0.0..=1.0).contains(&outgoing), "outgoing {outgoing}");
        prop_assert!((0.0..=1.0).contains(&incoming), "incoming {incoming}");
    }

    /// Smooth is a constant-sum crossfade: the two gains always total 1
    #[test]
    fn smooth_gains_sum_to_unity(frac in 0.0f32..=1.0) {
        let (outgoing, incoming) = TransitionMode::Smooth.gains(frac);
        prop_assert!((outgoing + incoming - 1.0).abs() < 1e-5);
    }

    /// Fade and Smooth ramps never move backwards
    #[test]
    fn ramp_gains_are_monotonic(frac_a in 0.0f32..=1.0, frac_b in 0.0f32..=1.0) {
        let (lo, hi) = if frac_a <= frac_b { (frac_a, frac_b) } else { (frac_b, frac_a) };
        for mode in [TransitionMode::Fade, TransitionMode::Smooth] {
            let (out_lo, in_lo) = mode.gains(lo);
            let (out_hi, in_hi) = mode.gains(hi);
            prop_assert!(out_hi <= out_lo + 1e-5);
            prop_assert!(in_hi + 1e-5 >= in_lo);
        }
    }

    /// A transition always finishes in exactly ceil(ms / 100) ticks (min 1)
    #[test]
    fn transition_completes_in_planned_steps(mode in arbitrary_mode(), ms in 0u64..20_000) {
        let mut state = TransitionState::new(mode, Duration::from_millis(ms));
        let expected = ms.div_ceil(100).max(1) as u32;
        prop_assert_eq!(state.total_steps(), expected);

        let mut ticks = 0u32;
        while !state.is_complete() {
            let frac = state.advance();
            ticks += 1;
            prop_assert!((0.0..=1.0).contains(&frac));
            prop_assert!(ticks <= expected, "ran past the planned step count");
        }
        prop_assert_eq!(ticks, expected);
        prop_assert_eq!(state.fraction(), 1.0);
    }

    /// Forward navigation only ever lands on playable items, in order
    #[test]
    fn next_playable_is_playable_and_increasing(items in arbitrary_items()) {
        let mut queue = QueueModel::new();
        queue.set_items(items);

        let mut cursor = None;
        let mut visited = 0usize;
        while let Some(next) = queue.next_playable_after(cursor) {
            if let Some(prev) = cursor {
                prop_assert!(next > prev);
            }
            let item = queue.item(next);
            prop_assert!(item.is_some_and(QueueItem::is_playable));
            cursor = Some(next);
            visited += 1;
            prop_assert!(visited <= queue.len(), "navigation loops");
        }

        let playable = queue.items().iter().filter(|i| i.is_playable()).count();
        prop_assert_eq!(visited, playable, "every playable item is reachable exactly once");
    }

    /// previous() undoes next(): walking back lands on the prior stop
    #[test]
    fn previous_inverts_next(items in arbitrary_items()) {
        let mut queue = QueueModel::new();
        queue.set_items(items);

        if let Some(first) = queue.next_playable_after(None) {
            if let Some(second) = queue.next_playable_after(Some(first)) {
                prop_assert_eq!(queue.previous_playable_before(Some(second)), Some(first));
            }
            prop_assert_eq!(queue.previous_playable_before(Some(first)), None);
        }
    }
}
