//! Property-based tests for the cue engine and session state machine
//!
//! Uses proptest to verify invariants across many random inputs.

use cue_core::{Marker, Track};
use cue_playback::{
    BackendNotification, CueEngine, NotificationOutcome, PlaybackSession, SessionPhase,
};
use proptest::prelude::*;
use std::time::Duration;

// ===== Helpers =====

fn track() -> Track {
    Track::catalog("1", "Song", Duration::from_secs(600))
}

/// (timestamp, cue offset) in milliseconds
fn arbitrary_window() -> impl Strategy<Value = (u64, u64)> {
    (1u64..600_000, 0u64..30_000)
}

fn arbitrary_marker() -> impl Strategy<Value = Marker> {
    (arbitrary_window(), proptest::option::of(0u64..10_000)).prop_map(
        |((timestamp, offset), loop_ms)| {
            let marker = Marker::new(track().identity, Duration::from_millis(timestamp))
                .with_cue_offset(Duration::from_millis(offset));
            match loop_ms {
                Some(ms) => marker.with_loop(Duration::from_millis(ms)),
                None => marker,
            }
        },
    )
}

fn notification(id: usize) -> BackendNotification {
    BackendNotification::now_playing(
        Track::catalog(format!("t{id}"), format!("Track {id}"), Duration::from_secs(200)),
        true,
    )
}

// ===== Cue Engine =====

proptest! {
    /// Property: Progress stays in [0, 1] for any playback time
    #[test]
    fn cue_progress_is_bounded(
        marker in arbitrary_marker(),
        times in prop::collection::vec(0u64..700_000, 1..100)
    ) {
        let mut engine = CueEngine::new();
        engine.arm(marker, None);

        for t in times {
            let update = engine.update(Duration::from_millis(t));
            prop_assert!((0.0..=1.0).contains(&update.progress));
            prop_assert!((0.0..=1.0).contains(&engine.progress()));
        }
    }

    /// Property: Without looping, forward playback never moves progress backwards
    #[test]
    fn cue_progress_is_monotonic_without_loop(
        (timestamp, offset) in arbitrary_window(),
        mut times in prop::collection::vec(0u64..700_000, 1..100)
    ) {
        times.sort_unstable();
        let marker = Marker::new(track().identity, Duration::from_millis(timestamp))
            .with_cue_offset(Duration::from_millis(offset));

        let mut engine = CueEngine::new();
        engine.arm(marker, None);

        let mut last = 0.0;
        for t in times {
            engine.update(Duration::from_millis(t));
            prop_assert!(
                engine.progress() >= last,
                "progress fell from {} to {} at {}ms",
                last,
                engine.progress(),
                t
            );
            last = engine.progress();
        }
    }

    /// Property: The trigger fires at most once per arm, in any order of times
    #[test]
    fn cue_triggers_at_most_once(
        marker in arbitrary_marker(),
        times in prop::collection::vec(0u64..700_000, 1..200)
    ) {
        let mut engine = CueEngine::new();
        engine.arm(marker, None);

        let fired = times
            .into_iter()
            .filter(|t| engine.update(Duration::from_millis(*t)).triggered.is_some())
            .count();
        prop_assert!(fired <= 1);
    }

    /// Property: Loop seeks always land on the window start
    #[test]
    fn cue_loops_back_to_window_start(
        marker in arbitrary_marker(),
        times in prop::collection::vec(0u64..700_000, 1..100)
    ) {
        let mut engine = CueEngine::new();
        let start = engine.arm(marker, None).start_time;

        for t in times {
            if let Some(target) = engine.update(Duration::from_millis(t)).seek_to {
                prop_assert_eq!(target, start);
                // The seek lands
                engine.update(target);
            }
        }
    }
}

// ===== Session =====

proptest! {
    /// Property: Only the latest request can be confirmed
    #[test]
    fn session_confirms_only_latest_request(
        requests in 2usize..12,
        stale in prop::collection::vec(any::<prop::sample::Index>(), 0..20)
    ) {
        let mut session = PlaybackSession::new();
        let generations: Vec<u64> = (0..requests)
            .map(|i| session.begin_request(notification(i).track.unwrap()))
            .collect();
        let latest = requests - 1;

        // Notifications for any earlier request are stale
        for index in stale {
            let earlier = index.index(latest);
            let outcome = session.apply_notification(&notification(earlier));
            prop_assert_eq!(outcome, NotificationOutcome::Stale);
            prop_assert_eq!(session.phase(), SessionPhase::Pending);
            prop_assert!(session.current().is_none());
        }

        for generation in &generations[..latest] {
            prop_assert!(!session.is_current(*generation));
            prop_assert!(!session.mark_started(*generation));
            prop_assert!(session.expire_grace(*generation).is_none());
        }

        let outcome = session.apply_notification(&notification(latest));
        prop_assert!(matches!(outcome, NotificationOutcome::Confirmed(_)));
        prop_assert_eq!(session.phase(), SessionPhase::Playing);
        prop_assert_eq!(
            session.current().map(|t| t.identity.clone()),
            notification(latest).track.map(|t| t.identity)
        );
        prop_assert!(session.pending().is_none());
    }
}
