//! Playback coordinator
//!
//! One task owns the session, the cue engine, the debouncer and all timers.
//! Everything else talks to it through a [`CoordinatorHandle`]: commands go
//! in over a channel and are applied one at a time, state comes out through
//! a watch channel and an event broadcast.
//!
//! # Example
//!
//! ```rust,ignore
//! let handle = CoordinatorBuilder::new(system, app, catalog, library)
//!     .haptics(Arc::new(TapticEngine::new()))
//!     .config(CoordinatorConfig::load(None)?)
//!     .spawn()?;
//!
//! handle.play_queue_with_debounce(album_tracks).await?;
//! let snapshot = handle.snapshot();
//! ```

mod actor;

use crate::backend::PlaybackBackend;
use crate::config::CoordinatorConfig;
use crate::events::CoordinatorEvent;
use crate::session::SessionSnapshot;
use crate::types::{BackendKind, BackendNotification, PlayOutcome};
use actor::CoordinatorActor;
use cue_core::{
    CatalogResolver, CueError, HapticFeedback, LibraryResolver, Marker, NoopHaptics, NoopHistory,
    PlaybackHistory, Result, Track,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Depth of the command mailbox
const COMMAND_CAPACITY: usize = 32;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Public commands, applied in arrival order
enum Command {
    Play(Reply<()>),
    Pause(Reply<()>),
    TogglePlayPause(Reply<bool>),
    Seek(Duration, Reply<()>),
    StartDragging,
    UpdateDragPosition(Duration),
    EndDragging(Duration, Reply<()>),
    SkipNext(Reply<()>),
    SkipPrevious(Reply<()>),
    PlaySingle(Track, Reply<PlayOutcome>),
    PlayQueue(Vec<Track>, Reply<PlayOutcome>),
    ArmCue {
        marker: Marker,
        cue_offset: Option<Duration>,
        reply: Reply<()>,
    },
    DisarmCue,
    SetCueLoopEnabled(bool, Reply<bool>),
    PlayFromMarker(Marker, Reply<()>),
    Notify(BackendKind, BackendNotification),
    Shutdown(oneshot::Sender<()>),
}

/// Builds and spawns a playback coordinator
pub struct CoordinatorBuilder {
    system: Arc<dyn PlaybackBackend>,
    app: Arc<dyn PlaybackBackend>,
    catalog: Arc<dyn CatalogResolver>,
    library: Arc<dyn LibraryResolver>,
    history: Arc<dyn PlaybackHistory>,
    haptics: Arc<dyn HapticFeedback>,
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    /// Start from the two backends and the two lookup services
    pub fn new(
        system: Arc<dyn PlaybackBackend>,
        app: Arc<dyn PlaybackBackend>,
        catalog: Arc<dyn CatalogResolver>,
        library: Arc<dyn LibraryResolver>,
    ) -> Self {
        Self {
            system,
            app,
            catalog,
            library,
            history: Arc::new(NoopHistory),
            haptics: Arc::new(NoopHaptics),
            config: CoordinatorConfig::default(),
        }
    }

    /// Record confirmed tracks here
    #[must_use]
    pub fn history(mut self, history: Arc<dyn PlaybackHistory>) -> Self {
        self.history = history;
        self
    }

    /// Pulse here when a cue triggers
    #[must_use]
    pub fn haptics(mut self, haptics: Arc<dyn HapticFeedback>) -> Self {
        self.haptics = haptics;
        self
    }

    /// Override timing configuration
    #[must_use]
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and spawn the coordinator task
    ///
    /// Must be called from within a tokio runtime. The task stops on
    /// [`CoordinatorHandle::shutdown`] or when every handle is dropped.
    pub fn spawn(self) -> Result<CoordinatorHandle> {
        self.config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let (event_tx, _) = broadcast::channel(self.config.event_capacity);

        let actor = CoordinatorActor::new(self, snapshot_tx, event_tx.clone());
        tokio::spawn(actor.run(command_rx));

        Ok(CoordinatorHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            events: event_tx,
        })
    }
}

impl std::fmt::Debug for CoordinatorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Cloneable handle to a running coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl CoordinatorHandle {
    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.cast(command(reply)).await?;
        response.await.map_err(|_| CueError::CoordinatorClosed)?
    }

    async fn cast(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CueError::CoordinatorClosed)
    }

    /// Latest session state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every state change
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to coordinator events
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Resume playback on the authoritative backend
    pub async fn play(&self) -> Result<()> {
        self.call(Command::Play).await
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<()> {
        self.call(Command::Pause).await
    }

    /// Flip play/pause, returning whether audio is now playing
    pub async fn toggle_play_pause(&self) -> Result<bool> {
        self.call(Command::TogglePlayPause).await
    }

    /// Seek within the current track
    ///
    /// Position polling pauses until the seek has settled so the backend's
    /// old position cannot overwrite the new one.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        self.call(|reply| Command::Seek(position, reply)).await
    }

    /// The user grabbed the seek bar
    pub async fn start_dragging(&self) -> Result<()> {
        self.cast(Command::StartDragging).await
    }

    /// Show a drag position without seeking
    pub async fn update_drag_position(&self, position: Duration) -> Result<()> {
        self.cast(Command::UpdateDragPosition(position)).await
    }

    /// The user let go of the seek bar at `position`
    pub async fn end_dragging(&self, position: Duration) -> Result<()> {
        self.call(|reply| Command::EndDragging(position, reply)).await
    }

    /// Advance to the next queue entry
    pub async fn skip_next(&self) -> Result<()> {
        self.call(Command::SkipNext).await
    }

    /// Restart the track, or go back one if near its start
    pub async fn skip_previous(&self) -> Result<()> {
        self.call(Command::SkipPrevious).await
    }

    /// Play a single track, superseding any earlier request
    pub async fn play_single(&self, track: Track) -> Result<PlayOutcome> {
        self.call(|reply| Command::PlaySingle(track, reply)).await
    }

    /// Play the first resolvable candidate now and queue the rest after the
    /// debounce delay
    ///
    /// # Errors
    /// `EmptyQueue` for an empty list, `NoValidItem` when nothing resolves,
    /// or the head lookup/backend failure.
    pub async fn play_queue_with_debounce(&self, tracks: Vec<Track>) -> Result<PlayOutcome> {
        self.call(|reply| Command::PlayQueue(tracks, reply)).await
    }

    /// Arm `marker` with its own cue offset
    pub async fn arm_cue(&self, marker: Marker) -> Result<()> {
        self.arm_cue_with_offset(marker, None).await
    }

    /// Arm `marker`, replacing its cue offset with `cue_offset` when given
    pub async fn arm_cue_with_offset(
        &self,
        marker: Marker,
        cue_offset: Option<Duration>,
    ) -> Result<()> {
        self.call(|reply| Command::ArmCue {
            marker,
            cue_offset,
            reply,
        })
        .await
    }

    /// Stop tracking the armed cue
    pub async fn disarm_cue(&self) -> Result<()> {
        self.cast(Command::DisarmCue).await
    }

    /// Toggle looping of the armed cue
    ///
    /// Returns false when no cue is armed.
    pub async fn set_cue_loop_enabled(&self, enabled: bool) -> Result<bool> {
        self.call(|reply| Command::SetCueLoopEnabled(enabled, reply))
            .await
    }

    /// Arm `marker`, seek to its start and play
    ///
    /// # Errors
    /// `InvalidInput` unless the marker's track is the current track.
    pub async fn play_from_marker(&self, marker: Marker) -> Result<()> {
        self.call(|reply| Command::PlayFromMarker(marker, reply))
            .await
    }

    /// Deliver a backend notification
    ///
    /// Called by platform glue whenever a backend reports a new now-playing
    /// item or transport state.
    pub async fn notify(&self, backend: BackendKind, notification: BackendNotification) -> Result<()> {
        self.cast(Command::Notify(backend, notification)).await
    }

    /// Stop the coordinator, cancelling in-flight work and timers
    pub async fn shutdown(&self) -> Result<()> {
        let (done, stopped) = oneshot::channel();
        self.cast(Command::Shutdown(done)).await?;
        stopped.await.map_err(|_| CueError::CoordinatorClosed)
    }

    /// Whether the coordinator task has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
