//! Collaborator traits for Cue Player
//!
//! The playback core never talks to a catalog service, a media library or a
//! database directly. Platform shells implement these traits and hand them
//! to the coordinator at construction time.

use crate::error::Result;
use crate::types::{CatalogId, LibraryQuery, Track, TrackIdentity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Remote catalog lookup
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Resolve a catalog item into playable track metadata
    ///
    /// # Errors
    /// `NotFound` on a miss, `Network` on transport failure,
    /// `NotAuthorized` when catalog access is refused
    async fn resolve_catalog_item(&self, id: &CatalogId) -> Result<Track>;
}

/// Local library lookup
#[async_trait]
pub trait LibraryResolver: Send + Sync {
    /// Resolve a library item by persistent id or by metadata
    ///
    /// # Errors
    /// `LibraryItemNotFound` (or `NotFound`) when nothing matches
    async fn resolve_library_item(&self, query: &LibraryQuery) -> Result<Track>;
}

/// Play history persistence
///
/// Fire-and-forget from the core's point of view: failures are logged by the
/// caller and never affect playback.
#[async_trait]
pub trait PlaybackHistory: Send + Sync {
    /// Record that `track` started playing at `played_at`
    async fn persist_last_played(
        &self,
        track: &TrackIdentity,
        played_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Haptic pulse on cue triggers
pub trait HapticFeedback: Send + Sync {
    /// Fire a single pulse. Must not block.
    fn pulse(&self);
}

/// History sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHistory;

#[async_trait]
impl PlaybackHistory for NoopHistory {
    async fn persist_last_played(
        &self,
        _track: &TrackIdentity,
        _played_at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Haptics for platforms without a taptic engine
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHaptics;

impl HapticFeedback for NoopHaptics {
    fn pulse(&self) {}
}
