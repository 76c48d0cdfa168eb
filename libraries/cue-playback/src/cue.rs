//! Cue timing engine
//!
//! Converts playback-time updates into progress through the armed marker's
//! window `[start, end]`, fires a trigger once per pass over `end`, and
//! optionally loops back to `start` after `end + loop_duration`.

use crate::events::DisarmReason;
use cue_core::{Marker, MarkerId};
use std::time::Duration;
use tracing::debug;

/// Derived timing state of an armed marker
#[derive(Debug, Clone, PartialEq)]
pub struct CueState {
    /// Armed marker
    pub marker: Marker,

    /// Window start, `max(0, timestamp - offset)`
    pub start_time: Duration,

    /// Window end, the marker timestamp
    pub end_time: Duration,

    /// Whether playback jumps back after the loop window
    pub loop_enabled: bool,

    /// How long past `end_time` to keep playing before looping
    pub loop_duration: Duration,
}

/// Result of feeding one playback time to the engine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CueUpdate {
    /// Progress through the window in `[0, 1]`
    pub progress: f64,

    /// The marker-pass trigger fired on this update
    pub triggered: Option<MarkerId>,

    /// The caller should seek here to loop
    pub seek_to: Option<Duration>,

    /// The cue disarmed on this update
    pub disarmed: Option<(MarkerId, DisarmReason)>,
}

/// Tracks one armed marker against playback time
#[derive(Debug, Default)]
pub struct CueEngine {
    state: Option<CueState>,
    progress: f64,
    last_triggered: Option<MarkerId>,
    loop_seek_pending: bool,
}

impl CueEngine {
    /// Create an engine with nothing armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `marker`, replacing whatever was armed
    ///
    /// `cue_offset_override` replaces the marker's own offset. Re-arming
    /// clears the trigger memory so the marker can fire again.
    pub fn arm(&mut self, marker: Marker, cue_offset_override: Option<Duration>) -> &CueState {
        let state = CueState {
            start_time: marker.start_time(cue_offset_override),
            end_time: marker.end_time(),
            loop_enabled: marker.loops(),
            loop_duration: marker.loop_duration.unwrap_or(Duration::ZERO),
            marker,
        };
        debug!(
            "Armed cue {} [{:.3}s, {:.3}s]",
            state.marker.id,
            state.start_time.as_secs_f64(),
            state.end_time.as_secs_f64()
        );

        self.progress = 0.0;
        self.last_triggered = None;
        self.loop_seek_pending = false;
        self.state.insert(state)
    }

    /// Drop the armed marker
    pub fn disarm(&mut self) -> Option<CueState> {
        self.progress = 0.0;
        self.loop_seek_pending = false;
        self.state.take()
    }

    /// Turn looping on or off for the armed marker
    ///
    /// Returns false when nothing is armed.
    pub fn set_loop_enabled(&mut self, enabled: bool) -> bool {
        match &mut self.state {
            Some(state) => {
                state.loop_enabled = enabled;
                if !enabled {
                    self.loop_seek_pending = false;
                }
                true
            }
            None => false,
        }
    }

    /// The loop seek issued by the last update did not happen
    ///
    /// The next update past the loop window asks for it again.
    pub fn loop_seek_failed(&mut self) {
        self.loop_seek_pending = false;
    }

    /// Armed state, if any
    pub fn state(&self) -> Option<&CueState> {
        self.state.as_ref()
    }

    /// Whether a marker is armed
    pub fn is_armed(&self) -> bool {
        self.state.is_some()
    }

    /// Last computed progress
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Feed one playback time
    pub fn update(&mut self, time: Duration) -> CueUpdate {
        let Some(state) = &self.state else {
            return CueUpdate::default();
        };

        let (start, end) = (state.start_time, state.end_time);

        if time < end {
            // Back inside (or before) the window, a loop seek has landed
            self.loop_seek_pending = false;
            self.progress = window_progress(time, start, end);
            return CueUpdate {
                progress: self.progress,
                ..CueUpdate::default()
            };
        }

        let marker_id = state.marker.id.clone();
        let mut update = CueUpdate {
            progress: 1.0,
            ..CueUpdate::default()
        };

        if self.last_triggered.as_ref() != Some(&marker_id) {
            debug!("Cue {} passed at {:.3}s", marker_id, time.as_secs_f64());
            self.last_triggered = Some(marker_id.clone());
            update.triggered = Some(marker_id.clone());
        }

        if state.loop_enabled {
            if time >= end + state.loop_duration && !self.loop_seek_pending {
                debug!("Cue {} looping back to {:.3}s", marker_id, start.as_secs_f64());
                self.loop_seek_pending = true;
                update.seek_to = Some(start);
                update.progress = 0.0;
            }
        } else {
            self.state = None;
            update.disarmed = Some((marker_id, DisarmReason::Passed));
        }

        self.progress = update.progress;
        update
    }
}

fn window_progress(time: Duration, start: Duration, end: Duration) -> f64 {
    if time < start {
        return 0.0;
    }
    if time >= end {
        return 1.0;
    }

    let elapsed = (time - start).as_secs_f64();
    let window = (end - start).as_secs_f64();
    (elapsed / window).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_core::Track;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn marker(timestamp: f64, offset: f64) -> Marker {
        let track = Track::catalog("1", "Song", Duration::from_secs(300));
        Marker::for_track(&track, secs(timestamp))
            .unwrap()
            .with_cue_offset(secs(offset))
    }

    #[test]
    fn test_failed_loop_seek_is_retried() {
        let mut engine = CueEngine::new();
        engine.arm(marker(90.0, 5.0).with_loop(secs(4.0)), None);

        assert_eq!(engine.update(secs(94.0)).seek_to, Some(secs(85.0)));
        // Still reported past the window, but the seek is in flight
        assert_eq!(engine.update(secs(94.1)).seek_to, None);

        engine.loop_seek_failed();
        let update = engine.update(secs(94.2));
        assert_eq!(update.seek_to, Some(secs(85.0)));
        assert!(update.triggered.is_none());
    }

    #[test]
    fn test_window_from_marker() {
        let mut engine = CueEngine::new();
        let state = engine.arm(marker(90.0, 5.0), None);
        assert_eq!(state.start_time, secs(85.0));
        assert_eq!(state.end_time, secs(90.0));
    }

    #[test]
    fn test_start_clamps_to_zero() {
        let mut engine = CueEngine::new();
        let state = engine.arm(marker(5.0, 10.0), None);
        assert_eq!(state.start_time, Duration::ZERO);
    }

    #[test]
    fn test_progress_midway() {
        let mut engine = CueEngine::new();
        engine.arm(marker(90.0, 5.0), None);

        let update = engine.update(secs(87.5));
        assert!((update.progress - 0.5).abs() < 1e-9);
        assert!(update.triggered.is_none());
    }

    #[test]
    fn test_before_window_holds_zero() {
        let mut engine = CueEngine::new();
        engine.arm(marker(90.0, 5.0), None);

        let update = engine.update(secs(10.0));
        assert_eq!(update.progress, 0.0);
        assert!(update.triggered.is_none());
        assert!(engine.is_armed());
    }

    #[test]
    fn test_trigger_fires_once_then_disarms() {
        let mut engine = CueEngine::new();
        let m = marker(90.0, 5.0);
        engine.arm(m.clone(), None);

        let mut fired = 0;
        for tenth in 850..=920 {
            let update = engine.update(Duration::from_millis(tenth * 100));
            if update.triggered.is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert!(!engine.is_armed());
    }

    #[test]
    fn test_passing_disarms_with_reason() {
        let mut engine = CueEngine::new();
        let m = marker(90.0, 5.0);
        engine.arm(m.clone(), None);

        let update = engine.update(secs(90.0));
        assert_eq!(update.triggered, Some(m.id.clone()));
        assert_eq!(update.disarmed, Some((m.id, DisarmReason::Passed)));
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_loop_reseeks_without_retrigger() {
        let mut engine = CueEngine::new();
        let m = marker(90.0, 5.0).with_loop(secs(2.0));
        engine.arm(m.clone(), None);

        assert_eq!(engine.update(secs(90.0)).triggered, Some(m.id.clone()));

        let inside_loop = engine.update(secs(91.0));
        assert!(inside_loop.triggered.is_none());
        assert!(inside_loop.seek_to.is_none());
        assert!(engine.is_armed());

        let wrap = engine.update(secs(92.0));
        assert_eq!(wrap.seek_to, Some(secs(85.0)));
        assert_eq!(wrap.progress, 0.0);

        // Stale position before the seek lands does not seek twice
        assert!(engine.update(secs(92.1)).seek_to.is_none());

        // Second pass: progress resets, no second trigger
        assert_eq!(engine.update(secs(85.0)).progress, 0.0);
        assert!(engine.update(secs(90.0)).triggered.is_none());
        assert_eq!(engine.update(secs(92.0)).seek_to, Some(secs(85.0)));
    }

    #[test]
    fn test_rearm_resets_trigger() {
        let mut engine = CueEngine::new();
        let m = marker(30.0, 5.0).with_loop(secs(1.0));

        engine.arm(m.clone(), None);
        assert!(engine.update(secs(30.0)).triggered.is_some());
        assert!(engine.update(secs(30.5)).triggered.is_none());

        engine.arm(m, None);
        assert!(engine.update(secs(30.5)).triggered.is_some());
    }

    #[test]
    fn test_disabling_loop_disarms_on_next_pass() {
        let mut engine = CueEngine::new();
        engine.arm(marker(30.0, 5.0).with_loop(secs(5.0)), None);
        engine.update(secs(31.0));
        assert!(engine.is_armed());

        assert!(engine.set_loop_enabled(false));
        let update = engine.update(secs(31.1));
        assert!(update.disarmed.is_some());
        assert!(!engine.is_armed());
        assert!(!engine.set_loop_enabled(true));
    }

    #[test]
    fn test_zero_length_window() {
        let mut engine = CueEngine::new();
        engine.arm(marker(20.0, 0.0), None);

        assert_eq!(engine.update(secs(19.9)).progress, 0.0);
        let update = engine.update(secs(20.0));
        assert_eq!(update.progress, 1.0);
        assert!(update.triggered.is_some());
    }

    #[test]
    fn test_offset_override() {
        let mut engine = CueEngine::new();
        let state = engine.arm(marker(60.0, 5.0), Some(secs(20.0)));
        assert_eq!(state.start_time, secs(40.0));
    }
}
