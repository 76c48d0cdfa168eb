//! Playback session state machine
//!
//! Tracks what is playing (`current`), what the user just asked for
//! (`pending`) and which identity we are waiting on (`expected`).
//!
//! ```text
//!            begin_request
//!   Idle ───────────────────► Pending ──confirm──► Playing
//!    ▲                          │  ▲                  │
//!    └──── grace / failure ─────┘  └── begin_request ─┘
//! ```
//!
//! While `expected` is set, `current` stays empty and notifications for any
//! other identity are stale. Every request bumps a generation so results of
//! superseded requests can be recognised and dropped.

use crate::types::BackendNotification;
use cue_core::{Track, TrackIdentity};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Coarse session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Nothing current or pending
    Idle,

    /// Waiting for a backend to confirm the requested track
    Pending,

    /// A confirmed track is loaded
    Playing,
}

/// What a backend notification did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// Dropped: it was for a track other than the one we expect
    Stale,

    /// Confirmed the expected track, which is now current
    Confirmed(Track),

    /// Steady-state tracking moved to a different track (or to none)
    TrackChanged(Option<Track>),

    /// Same track as before
    Unchanged,
}

impl NotificationOutcome {
    /// The new current track if it changed to one
    pub fn started_track(&self) -> Option<&Track> {
        match self {
            Self::Confirmed(track) | Self::TrackChanged(Some(track)) => Some(track),
            _ => None,
        }
    }

    /// Whether `current` changed
    pub fn changed_current(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::TrackChanged(_))
    }
}

/// Observable session state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Confirmed current track
    pub current_track: Option<Track>,

    /// Requested track waiting for confirmation
    pub pending_track: Option<Track>,

    /// Whether audio is playing
    pub is_playing: bool,

    /// Playback (or drag) position
    pub playback_time: Duration,

    /// Duration of the current or pending track
    pub playback_duration: Duration,

    /// Progress through the cue window; holds 1 after a pass until re-armed
    pub cue_progress: f64,

    /// A play request is resolving or starting
    pub is_loading_song: bool,

    /// A seek is settling
    pub is_seeking: bool,

    /// The user is dragging the seek bar
    pub is_dragging: bool,
}

/// The mutable heart of playback coordination
///
/// Owned by the coordinator actor; nothing else mutates it.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    current: Option<Track>,
    pending: Option<Track>,
    expected: Option<TrackIdentity>,
    is_playing: bool,
    playback_time: Duration,
    is_seeking: bool,
    is_dragging: bool,
    is_loading: bool,
    generation: u64,
}

impl PlaybackSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a play request for `track`
    ///
    /// Sets pending, clears current and gates notifications on the track's
    /// identity. Returns the generation of the new request.
    pub fn begin_request(&mut self, track: Track) -> u64 {
        self.generation += 1;
        debug!("Play request {} for {}", self.generation, track.identity);

        self.expected = Some(track.identity.clone());
        self.pending = Some(track);
        self.current = None;
        self.is_loading = true;
        self.playback_time = Duration::ZERO;
        self.generation
    }

    /// Generation of the latest request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `generation` is still the latest request
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Point an outstanding request at the track that actually resolved
    ///
    /// Queue heads can be a later candidate than the first, and library
    /// metadata fallbacks can resolve to a different identity. No-op once
    /// the request is superseded or no longer waiting.
    pub fn retarget(&mut self, generation: u64, track: &Track) -> bool {
        if !self.is_current(generation) || self.expected.is_none() {
            return false;
        }
        if self.expected.as_ref() == Some(&track.identity) {
            return false;
        }

        debug!("Request {} now expects {}", generation, track.identity);
        self.expected = Some(track.identity.clone());
        self.pending = Some(track.clone());
        true
    }

    /// The backend accepted request `generation`
    pub fn mark_started(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.is_loading = false;
        true
    }

    /// Request `generation` failed: drop the optimistic state
    pub fn fail_request(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.pending = None;
        self.expected = None;
        self.is_loading = false;
        true
    }

    /// Grace period for request `generation` ran out
    ///
    /// Returns the identity that was expected if the session went back to
    /// idle.
    pub fn expire_grace(&mut self, generation: u64) -> Option<TrackIdentity> {
        if !self.is_current(generation) {
            return None;
        }
        let expected = self.expected.take()?;

        info!("No confirmation for {}, returning to idle", expected);
        self.pending = None;
        self.current = None;
        self.is_loading = false;
        self.is_playing = false;
        Some(expected)
    }

    /// Apply a notification from the authoritative backend
    pub fn apply_notification(&mut self, notification: &BackendNotification) -> NotificationOutcome {
        if let Some(expected) = &self.expected {
            let Some(notified) = notification
                .track
                .as_ref()
                .filter(|t| &t.identity == expected)
            else {
                return NotificationOutcome::Stale;
            };

            let confirmed = self.pending.take().unwrap_or_else(|| notified.clone());
            debug!("Confirmed {}", confirmed.identity);

            self.expected = None;
            self.is_loading = false;
            self.current = Some(confirmed.clone());
            self.absorb(notification);
            return NotificationOutcome::Confirmed(confirmed);
        }

        self.absorb(notification);

        let before = self.current.as_ref().map(|t| &t.identity);
        let notified = notification.track.as_ref().map(|t| &t.identity);
        if before == notified {
            return NotificationOutcome::Unchanged;
        }

        self.current = notification.track.clone();
        NotificationOutcome::TrackChanged(self.current.clone())
    }

    fn absorb(&mut self, notification: &BackendNotification) {
        self.is_playing = notification.is_playing;
        if let Some(position) = notification.position {
            self.playback_time = position;
        }
    }

    /// Optimistically record play/pause
    pub fn set_playing(&mut self, is_playing: bool) {
        self.is_playing = is_playing;
    }

    /// Set the displayed position
    pub fn set_playback_time(&mut self, time: Duration) {
        self.playback_time = time;
    }

    /// Set or clear the seek-settle flag
    pub fn set_seeking(&mut self, seeking: bool) {
        self.is_seeking = seeking;
    }

    /// Begin a seek-bar drag
    pub fn start_dragging(&mut self) {
        self.is_dragging = true;
    }

    /// Show the drag position without touching the backend
    pub fn update_drag_position(&mut self, time: Duration) {
        if self.is_dragging {
            self.playback_time = time;
        }
    }

    /// Finish a seek-bar drag
    pub fn end_dragging(&mut self) {
        self.is_dragging = false;
    }

    /// Whether position polling should be skipped
    pub fn polling_suppressed(&self) -> bool {
        self.is_seeking || self.is_dragging
    }

    /// Coarse state
    pub fn phase(&self) -> SessionPhase {
        if self.expected.is_some() {
            SessionPhase::Pending
        } else if self.current.is_some() {
            SessionPhase::Playing
        } else {
            SessionPhase::Idle
        }
    }

    /// Confirmed current track
    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Requested track waiting for confirmation
    pub fn pending(&self) -> Option<&Track> {
        self.pending.as_ref()
    }

    /// Identity notifications are gated on
    pub fn expected(&self) -> Option<&TrackIdentity> {
        self.expected.as_ref()
    }

    /// Whether audio is playing
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Playback position
    pub fn playback_time(&self) -> Duration {
        self.playback_time
    }

    /// Duration of whatever the UI is showing
    pub fn playback_duration(&self) -> Duration {
        self.current
            .as_ref()
            .or(self.pending.as_ref())
            .map_or(Duration::ZERO, |t| t.duration)
    }

    /// Whether a request is resolving or starting
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether a seek is settling
    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    /// Whether the seek bar is being dragged
    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Observable view, with cue progress filled in by the caller
    pub fn snapshot(&self, cue_progress: f64) -> SessionSnapshot {
        SessionSnapshot {
            current_track: self.current.clone(),
            pending_track: self.pending.clone(),
            is_playing: self.is_playing,
            playback_time: self.playback_time,
            playback_duration: self.playback_duration(),
            cue_progress,
            is_loading_song: self.is_loading,
            is_seeking: self.is_seeking,
            is_dragging: self.is_dragging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::catalog(id, format!("Song {id}"), Duration::from_secs(200))
    }

    fn playing(track: &Track, secs: u64) -> BackendNotification {
        BackendNotification {
            track: Some(track.clone()),
            is_playing: true,
            position: Some(Duration::from_secs(secs)),
        }
    }

    #[test]
    fn test_request_sets_pending_and_clears_current() {
        let mut session = PlaybackSession::new();
        let a = track("a");
        let generation = session.begin_request(a.clone());
        session.apply_notification(&playing(&a, 0));
        assert_eq!(session.current(), Some(&a));

        let b = track("b");
        let next = session.begin_request(b.clone());
        assert!(next > generation);
        assert_eq!(session.current(), None);
        assert_eq!(session.pending(), Some(&b));
        assert_eq!(session.expected(), Some(&b.identity));
        assert!(session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Pending);
    }

    #[test]
    fn test_stale_notification_is_discarded() {
        let mut session = PlaybackSession::new();
        let a = track("a");
        let b = track("b");
        session.begin_request(b.clone());

        let outcome = session.apply_notification(&playing(&a, 42));
        assert_eq!(outcome, NotificationOutcome::Stale);
        assert_eq!(session.current(), None);
        assert_eq!(session.playback_time(), Duration::ZERO);
        assert_eq!(session.pending(), Some(&b));
    }

    #[test]
    fn test_matching_notification_confirms() {
        let mut session = PlaybackSession::new();
        let b = track("b");
        session.begin_request(b.clone());

        let outcome = session.apply_notification(&playing(&b, 1));
        assert_eq!(outcome, NotificationOutcome::Confirmed(b.clone()));
        assert_eq!(session.current(), Some(&b));
        assert_eq!(session.pending(), None);
        assert_eq!(session.expected(), None);
        assert!(!session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_steady_state_follows_backend() {
        let mut session = PlaybackSession::new();
        let a = track("a");
        let b = track("b");

        assert_eq!(
            session.apply_notification(&playing(&a, 3)),
            NotificationOutcome::TrackChanged(Some(a.clone()))
        );
        assert_eq!(
            session.apply_notification(&playing(&a, 4)),
            NotificationOutcome::Unchanged
        );
        assert_eq!(session.playback_time(), Duration::from_secs(4));

        assert_eq!(
            session.apply_notification(&playing(&b, 0)),
            NotificationOutcome::TrackChanged(Some(b.clone()))
        );
        assert_eq!(
            session.apply_notification(&BackendNotification::stopped()),
            NotificationOutcome::TrackChanged(None)
        );
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_grace_expiry_returns_to_idle() {
        let mut session = PlaybackSession::new();
        let generation = session.begin_request(track("a"));

        assert_eq!(session.expire_grace(generation), Some(track("a").identity));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.pending(), None);
        assert!(!session.is_loading());

        // Already expired
        assert_eq!(session.expire_grace(generation), None);
    }

    #[test]
    fn test_superseded_generation_cannot_mutate() {
        let mut session = PlaybackSession::new();
        let old = session.begin_request(track("a"));
        let new = session.begin_request(track("b"));

        assert!(!session.fail_request(old));
        assert!(!session.mark_started(old));
        assert!(!session.retarget(old, &track("c")));
        assert_eq!(session.expire_grace(old), None);
        assert_eq!(session.pending(), Some(&track("b")));

        assert!(session.fail_request(new));
        assert_eq!(session.pending(), None);
        assert_eq!(session.expected(), None);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_retarget_moves_expected_identity() {
        let mut session = PlaybackSession::new();
        let generation = session.begin_request(track("a"));

        assert!(session.retarget(generation, &track("c")));
        assert_eq!(session.expected(), Some(&track("c").identity));
        assert_eq!(
            session.apply_notification(&playing(&track("a"), 0)),
            NotificationOutcome::Stale
        );
        assert!(session
            .apply_notification(&playing(&track("c"), 0))
            .started_track()
            .is_some());
    }

    #[test]
    fn test_drag_position_only_while_dragging() {
        let mut session = PlaybackSession::new();
        session.update_drag_position(Duration::from_secs(10));
        assert_eq!(session.playback_time(), Duration::ZERO);

        session.start_dragging();
        assert!(session.polling_suppressed());
        session.update_drag_position(Duration::from_secs(10));
        assert_eq!(session.playback_time(), Duration::from_secs(10));

        session.end_dragging();
        assert!(!session.polling_suppressed());
    }
}
