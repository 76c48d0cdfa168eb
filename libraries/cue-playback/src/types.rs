//! Core types for playback coordination

use cue_core::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which of the two playback engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// System-wide media player (shared with other apps)
    System,

    /// App-owned queued player
    App,
}

/// Transport state reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendState {
    /// Nothing loaded or playback ended
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Interrupted by the OS (call, alarm)
    Interrupted,

    /// Scrubbing forward/backward
    Seeking,
}

/// Non-blocking status snapshot of one backend
///
/// Backends keep this cached from their own callbacks so reading it never
/// performs I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Transport state
    pub state: BackendState,

    /// Item currently loaded
    pub current: Option<Track>,

    /// Playback position within `current`
    pub position: Duration,
}

impl BackendStatus {
    /// Status of an idle backend
    pub fn stopped() -> Self {
        Self {
            state: BackendState::Stopped,
            current: None,
            position: Duration::ZERO,
        }
    }

    /// Whether audio is actively playing
    pub fn is_playing(&self) -> bool {
        self.state == BackendState::Playing
    }

    /// Whether this backend claims authority (non-stopped or has an item)
    pub fn is_engaged(&self) -> bool {
        self.state != BackendState::Stopped || self.current.is_some()
    }
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Unified `(track, isPlaying, position)` notification
///
/// Pushed by platform glue when a backend's now-playing item or transport
/// state changes, and synthesized by the position poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendNotification {
    /// Item the backend reports as current
    pub track: Option<Track>,

    /// Whether the backend is playing
    pub is_playing: bool,

    /// Position, when the notification carries one
    pub position: Option<Duration>,
}

impl BackendNotification {
    /// Notification for `track` without position information
    pub fn now_playing(track: Track, is_playing: bool) -> Self {
        Self {
            track: Some(track),
            is_playing,
            position: None,
        }
    }

    /// Notification that the backend has nothing loaded
    pub fn stopped() -> Self {
        Self {
            track: None,
            is_playing: false,
            position: None,
        }
    }
}

impl From<&BackendStatus> for BackendNotification {
    fn from(status: &BackendStatus) -> Self {
        Self {
            track: status.current.clone(),
            is_playing: status.is_playing(),
            position: Some(status.position),
        }
    }
}

/// Repeat mode applied when a queue is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop when queue ends
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

/// Options for starting a backend queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueOptions {
    /// Shuffle the queue
    pub shuffle: bool,

    /// Repeat mode
    pub repeat: RepeatMode,
}

impl Default for QueueOptions {
    /// Shuffle off, repeat all
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatMode::All,
        }
    }
}

/// How a resolved item can be appended to a backend queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedKind {
    /// Catalog item: many can be appended with one store-id descriptor
    Catalog,

    /// Library item: appended one media item at a time
    Library,
}

/// A track that a lookup has confirmed playable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedItem {
    /// Resolved track metadata (identity may differ from the request for
    /// library metadata fallbacks)
    pub track: Track,

    /// Append grouping
    pub kind: ResolvedKind,
}

impl ResolvedItem {
    /// Whether the item can go into a batch append
    pub fn is_batch_appendable(&self) -> bool {
        self.kind == ResolvedKind::Catalog
    }
}

/// Resolution state of a queue candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Not looked up yet
    Unresolved,

    /// Lookup succeeded
    Playable(ResolvedItem),

    /// Lookup missed or failed
    NotFound,
}

/// A candidate submitted for queue building
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// Candidate track
    pub track: Track,

    /// Where resolution stands
    pub resolution: Resolution,
}

impl QueueItem {
    /// New unresolved candidate
    pub fn new(track: Track) -> Self {
        Self {
            track,
            resolution: Resolution::Unresolved,
        }
    }

    /// The resolved item, if playable
    pub fn playable(&self) -> Option<&ResolvedItem> {
        match &self.resolution {
            Resolution::Playable(item) => Some(item),
            _ => None,
        }
    }
}

/// Result of a user-initiated play request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayOutcome {
    /// The backend accepted the request
    Started,

    /// A newer request replaced this one before it took effect
    Superseded,
}
