//! Coordinator Events
//!
//! Discrete notifications broadcast to subscribers. Continuous state
//! (position, cue progress) lives in the session snapshot instead.
//!
//! Events are emitted at key points:
//! - Pending/current track transitions
//! - Queue head started and tail appended
//! - Cue armed, triggered, looped and disarmed
//! - Surfaced failures

use crate::types::BackendKind;
use cue_core::{MarkerId, Track, TrackIdentity};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoordinatorEvent {
    /// A play request registered new intent (or intent was dropped)
    PendingTrackChanged {
        /// Track about to play
        track: Option<Track>,
    },

    /// The confirmed current track changed
    TrackChanged {
        /// New current track
        track: Option<Track>,
    },

    /// Playing/paused flipped
    PlaybackStateChanged {
        /// Whether audio is playing
        is_playing: bool,
    },

    /// No backend confirmed the pending track in time
    GracePeriodExpired {
        /// Identity that was expected
        expected: TrackIdentity,
    },

    /// A queue head started playing
    QueueStarted {
        /// Track at the head
        head: Track,
        /// Backend the queue went to
        backend: BackendKind,
        /// Candidates before the head that did not resolve
        skipped: usize,
    },

    /// The debounced queue tail was appended
    QueueTailAppended {
        /// Items appended
        appended: usize,
        /// Items that failed to resolve
        skipped: usize,
    },

    /// A marker was armed
    CueArmed {
        /// Armed marker
        marker_id: MarkerId,
        /// Window start in milliseconds
        start_ms: u64,
        /// Window end in milliseconds
        end_ms: u64,
    },

    /// Playback passed the marker timestamp
    CueTriggered {
        /// Marker passed
        marker_id: MarkerId,
    },

    /// The loop window elapsed and playback jumped back to the cue start
    CueLooped {
        /// Looping marker
        marker_id: MarkerId,
    },

    /// The cue stopped tracking playback
    CueDisarmed {
        /// Marker that was armed
        marker_id: MarkerId,
        /// Why it was disarmed
        reason: DisarmReason,
    },

    /// An operation failed and the user should hear about it
    PlaybackFailed {
        /// Error message
        message: String,
    },
}

/// Why a cue was disarmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisarmReason {
    /// Playback passed the marker with looping off
    Passed,

    /// Explicit disarm or replaced by another marker
    User,

    /// A different track became current
    TrackChanged,
}
