//! Backend arbitration
//!
//! Two engines can be playing audio for us: the system-wide player (which
//! other apps and the lock screen can also drive) and our own queued player.
//! The system player wins whenever it has anything to say; otherwise our
//! player is in charge. Authority is re-evaluated on every call.

use crate::backend::PlaybackBackend;
use crate::types::{BackendKind, BackendStatus, QueueOptions, ResolvedItem};
use cue_core::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Status of whichever backend is authoritative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedStatus {
    /// Backend the status came from
    pub backend: BackendKind,

    /// Its status
    pub status: BackendStatus,
}

/// What skip-previous resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousAction {
    /// Restart the current track from zero
    Restart,

    /// Go to the previous queue entry
    Previous,
}

/// Routes operations to the authoritative backend
#[derive(Clone)]
pub struct BackendArbiter {
    system: Arc<dyn PlaybackBackend>,
    app: Arc<dyn PlaybackBackend>,
    restart_threshold: Duration,
}

impl BackendArbiter {
    /// Create an arbiter over the two backends
    pub fn new(
        system: Arc<dyn PlaybackBackend>,
        app: Arc<dyn PlaybackBackend>,
        restart_threshold: Duration,
    ) -> Self {
        Self {
            system,
            app,
            restart_threshold,
        }
    }

    /// Which backend is authoritative right now
    pub fn authority(&self) -> BackendKind {
        if self.system.status().is_engaged() {
            BackendKind::System
        } else {
            BackendKind::App
        }
    }

    /// Backend instance for `kind`
    pub fn backend(&self, kind: BackendKind) -> &Arc<dyn PlaybackBackend> {
        match kind {
            BackendKind::System => &self.system,
            BackendKind::App => &self.app,
        }
    }

    fn authoritative(&self) -> (BackendKind, &Arc<dyn PlaybackBackend>) {
        let kind = self.authority();
        (kind, self.backend(kind))
    }

    /// Status of the authoritative backend
    pub fn status(&self) -> UnifiedStatus {
        let (backend, engine) = self.authoritative();
        UnifiedStatus {
            backend,
            status: engine.status(),
        }
    }

    /// Whether notifications from `kind` should be listened to
    pub fn accepts(&self, kind: BackendKind) -> bool {
        let authority = self.authority();
        if kind != authority {
            debug!(
                "Ignoring {:?} backend notification, {:?} is authoritative",
                kind, authority
            );
            return false;
        }
        true
    }

    /// Resume playback
    pub async fn play(&self) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.play().await?;
        Ok(kind)
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.pause().await?;
        Ok(kind)
    }

    /// Flip between playing and paused
    ///
    /// Returns whether the backend is now playing.
    pub async fn toggle_play_pause(&self) -> Result<bool> {
        let (_, engine) = self.authoritative();
        if engine.status().is_playing() {
            engine.pause().await?;
            Ok(false)
        } else {
            engine.play().await?;
            Ok(true)
        }
    }

    /// Move the playhead
    pub async fn seek(&self, position: Duration) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.seek(position).await?;
        Ok(kind)
    }

    /// Advance to the next queue entry
    pub async fn skip_next(&self) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.skip_next().await?;
        Ok(kind)
    }

    /// Decide what skip-previous means at the current position
    ///
    /// Past the restart threshold it restarts the track instead of going
    /// back. The caller performs the restart as a regular seek.
    pub fn previous_action(&self) -> PreviousAction {
        if self.status().status.position > self.restart_threshold {
            PreviousAction::Restart
        } else {
            PreviousAction::Previous
        }
    }

    /// Delegate to the backend's previous-track behaviour
    pub async fn skip_previous(&self) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.skip_previous().await?;
        Ok(kind)
    }

    /// Replace the queue with `head` and start playing
    pub async fn start_queue(&self, head: &ResolvedItem, options: QueueOptions) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        debug!("Starting {:?} queue at {}", kind, head.track.identity);
        engine.start_queue(head, options).await?;
        Ok(kind)
    }

    /// Append batch-appendable items in one call
    pub async fn append_batch(&self, items: &[ResolvedItem]) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.append_batch(items).await?;
        Ok(kind)
    }

    /// Append a single item
    pub async fn append(&self, item: &ResolvedItem) -> Result<BackendKind> {
        let (kind, engine) = self.authoritative();
        engine.append(item).await?;
        Ok(kind)
    }
}

impl std::fmt::Debug for BackendArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendArbiter")
            .field("authority", &self.authority())
            .field("restart_threshold", &self.restart_threshold)
            .finish_non_exhaustive()
    }
}
