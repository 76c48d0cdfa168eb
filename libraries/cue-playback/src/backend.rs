//! Platform-agnostic playback backend trait
//!
//! Abstracts the two playback engines (system-wide player, app-owned queued
//! player) behind one capability so the arbiter can pick either per call.

use crate::types::{BackendStatus, QueueOptions, ResolvedItem};
use async_trait::async_trait;
use cue_core::Result;
use std::time::Duration;

/// A playback engine the coordinator can drive
///
/// Implementors wrap one platform player. All mutating calls may suspend
/// (the platform prepares audio asynchronously); `status` must not.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Cached transport state, current item and position
    ///
    /// Called from the position poll. Must return immediately without I/O.
    fn status(&self) -> BackendStatus;

    /// Resume or start playback
    async fn play(&self) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Move the playhead within the current item
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Advance to the next queue entry
    async fn skip_next(&self) -> Result<()>;

    /// Go back to the previous queue entry
    async fn skip_previous(&self) -> Result<()>;

    /// Replace the queue with `head` and start playing it
    async fn start_queue(&self, head: &ResolvedItem, options: QueueOptions) -> Result<()>;

    /// Append several batch-appendable items in one call
    async fn append_batch(&self, items: &[ResolvedItem]) -> Result<()>;

    /// Append a single item
    async fn append(&self, item: &ResolvedItem) -> Result<()>;
}
