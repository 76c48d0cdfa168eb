//! The coordinator task
//!
//! Three inputs feed one loop: public commands, internal completions
//! (resolution results, timer expiries) and the position poll. Each is
//! applied to completion before the next is looked at, and the snapshot is
//! republished after every step.

use super::{Command, CoordinatorBuilder, Reply};
use crate::arbiter::{BackendArbiter, PreviousAction};
use crate::config::CoordinatorConfig;
use crate::cue::CueEngine;
use crate::debouncer::{append_tail, resolve_head, resolve_tail, HeadResolution, QueueDebouncer};
use crate::events::{CoordinatorEvent, DisarmReason};
use crate::resolver::TrackResolver;
use crate::session::{NotificationOutcome, PlaybackSession, SessionSnapshot};
use crate::timer::DelayedTask;
use crate::types::{BackendKind, BackendNotification, PlayOutcome, QueueOptions};
use chrono::Utc;
use cue_core::{CueError, HapticFeedback, Marker, PlaybackHistory, Result, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Completions reported back to the actor by spawned work and timers
enum Internal {
    HeadResolved {
        generation: u64,
        head: HeadResolution,
        tail: Vec<Track>,
        token: CancellationToken,
        reply: Reply<PlayOutcome>,
    },
    RequestFailed {
        generation: u64,
        error: CueError,
        reply: Reply<PlayOutcome>,
    },
    TailAppended {
        generation: u64,
        appended: usize,
        skipped: usize,
    },
    GraceExpired {
        generation: u64,
    },
    SeekSettled {
        seq: u64,
    },
}

pub(super) struct CoordinatorActor {
    config: CoordinatorConfig,
    arbiter: BackendArbiter,
    debouncer: QueueDebouncer,
    session: PlaybackSession,
    cue: CueEngine,
    history: Arc<dyn PlaybackHistory>,
    haptics: Arc<dyn HapticFeedback>,
    grace: DelayedTask,
    seek_settle: DelayedTask,
    seek_seq: u64,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl CoordinatorActor {
    pub(super) fn new(
        builder: CoordinatorBuilder,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        events: broadcast::Sender<CoordinatorEvent>,
    ) -> Self {
        let config = builder.config;
        let arbiter =
            BackendArbiter::new(builder.system, builder.app, config.restart_threshold());
        let resolver = TrackResolver::new(builder.catalog, builder.library);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        Self {
            debouncer: QueueDebouncer::new(resolver, config.debounce()),
            config,
            arbiter,
            session: PlaybackSession::new(),
            cue: CueEngine::new(),
            history: builder.history,
            haptics: builder.haptics,
            grace: DelayedTask::new(),
            seek_settle: DelayedTask::new(),
            seek_seq: 0,
            internal_tx,
            internal_rx,
            snapshot_tx,
            events,
        }
    }

    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Playback coordinator started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown(done)) => {
                        self.stop();
                        let _ = done.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.stop();
                        break;
                    }
                },
                Some(message) = self.internal_rx.recv() => self.handle_internal(message).await,
                _ = ticker.tick() => self.poll().await,
            }
            self.publish();
        }

        info!("Playback coordinator stopped");
    }

    fn stop(&mut self) {
        self.debouncer.cancel();
        self.grace.cancel();
        self.seek_settle.cancel();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play(reply) => {
                let result = self.arbiter.play().await.map(|_| {
                    self.session.set_playing(true);
                });
                self.respond(reply, result);
            }
            Command::Pause(reply) => {
                let result = self.arbiter.pause().await.map(|_| {
                    self.session.set_playing(false);
                });
                self.respond(reply, result);
            }
            Command::TogglePlayPause(reply) => {
                let result = self.arbiter.toggle_play_pause().await;
                if let Ok(is_playing) = result {
                    self.session.set_playing(is_playing);
                }
                self.respond(reply, result);
            }
            Command::Seek(position, reply) => {
                let result = self.seek(position).await;
                self.respond(reply, result);
            }
            Command::StartDragging => self.session.start_dragging(),
            Command::UpdateDragPosition(position) => self.session.update_drag_position(position),
            Command::EndDragging(position, reply) => {
                self.session.end_dragging();
                let result = self.seek(position).await;
                self.respond(reply, result);
            }
            Command::SkipNext(reply) => {
                let result = self.arbiter.skip_next().await.map(|_| ());
                self.respond(reply, result);
            }
            Command::SkipPrevious(reply) => {
                let result = match self.arbiter.previous_action() {
                    PreviousAction::Restart => {
                        debug!("Skip previous past threshold, restarting track");
                        self.seek(Duration::ZERO).await
                    }
                    PreviousAction::Previous => self.arbiter.skip_previous().await.map(|_| ()),
                };
                self.respond(reply, result);
            }
            Command::PlaySingle(track, reply) => self.begin_play(vec![track], reply),
            Command::PlayQueue(tracks, reply) => {
                if tracks.is_empty() {
                    self.respond(reply, Err(CueError::EmptyQueue));
                } else {
                    self.begin_play(tracks, reply);
                }
            }
            Command::ArmCue {
                marker,
                cue_offset,
                reply,
            } => {
                self.arm_cue(marker, cue_offset);
                self.respond(reply, Ok(()));
            }
            Command::DisarmCue => self.disarm_cue(DisarmReason::User),
            Command::SetCueLoopEnabled(enabled, reply) => {
                let looping = self.cue.set_loop_enabled(enabled);
                self.respond(reply, Ok(looping));
            }
            Command::PlayFromMarker(marker, reply) => {
                let result = self.play_from_marker(marker).await;
                self.respond(reply, result);
            }
            Command::Notify(backend, notification) => {
                if self.arbiter.accepts(backend) {
                    self.apply_notification(&notification).await;
                }
            }
            // Handled by the run loop
            Command::Shutdown(_) => {}
        }
    }

    async fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::HeadResolved {
                generation,
                head,
                tail,
                token,
                reply,
            } => {
                if !self.session.is_current(generation) || token.is_cancelled() {
                    debug!("Request {} resolved after being superseded", generation);
                    self.respond(reply, Ok(PlayOutcome::Superseded));
                    return;
                }

                // Awaited here so a newer request can only start after this one
                match self
                    .arbiter
                    .start_queue(&head.item, QueueOptions::default())
                    .await
                {
                    Ok(backend) => self.head_started(generation, head, backend, tail, token, reply),
                    Err(error) => self.request_failed(generation, error, reply),
                }
            }
            Internal::RequestFailed {
                generation,
                error,
                reply,
            } => self.request_failed(generation, error, reply),
            Internal::TailAppended {
                generation,
                appended,
                skipped,
            } => {
                if self.session.is_current(generation) {
                    info!("Queue tail appended ({} items, {} skipped)", appended, skipped);
                    self.emit(CoordinatorEvent::QueueTailAppended { appended, skipped });
                }
            }
            Internal::GraceExpired { generation } => {
                if let Some(expected) = self.session.expire_grace(generation) {
                    self.emit(CoordinatorEvent::GracePeriodExpired { expected });
                    self.emit(CoordinatorEvent::PendingTrackChanged { track: None });
                }
            }
            Internal::SeekSettled { seq } => {
                if seq == self.seek_seq {
                    self.session.set_seeking(false);
                }
            }
        }
    }

    /// Register intent synchronously, then resolve and start in the background
    fn begin_play(&mut self, candidates: Vec<Track>, reply: Reply<PlayOutcome>) {
        let Some(first) = candidates.first().cloned() else {
            self.respond(reply, Err(CueError::EmptyQueue));
            return;
        };

        let generation = self.session.begin_request(first.clone());
        let token = self.debouncer.supersede();
        self.arm_grace(generation);
        self.emit(CoordinatorEvent::PendingTrackChanged { track: Some(first) });

        let resolver = self.debouncer.resolver().clone();
        let internal = self.internal_tx.clone();

        tokio::spawn(async move {
            let message = match resolve_head(&resolver, &candidates, &token).await {
                Ok(head) => Internal::HeadResolved {
                    generation,
                    tail: candidates.get(head.index + 1..).unwrap_or_default().to_vec(),
                    head,
                    token,
                    reply,
                },
                Err(error) => Internal::RequestFailed {
                    generation,
                    error,
                    reply,
                },
            };
            let _ = internal.send(message);
        });
    }

    fn head_started(
        &mut self,
        generation: u64,
        head: HeadResolution,
        backend: BackendKind,
        tail: Vec<Track>,
        token: CancellationToken,
        reply: Reply<PlayOutcome>,
    ) {
        if self.session.retarget(generation, &head.item.track) {
            self.emit(CoordinatorEvent::PendingTrackChanged {
                track: Some(head.item.track.clone()),
            });
        }
        self.session.mark_started(generation);

        info!(
            "Queue started on {:?} at {} ({} skipped, {} queued)",
            backend,
            head.item.track.identity,
            head.skipped(),
            tail.len()
        );
        self.emit(CoordinatorEvent::QueueStarted {
            head: head.item.track,
            backend,
            skipped: head.index,
        });

        if !tail.is_empty() {
            self.schedule_tail(generation, tail, token);
        }
        self.respond(reply, Ok(PlayOutcome::Started));
    }

    fn request_failed(&mut self, generation: u64, error: CueError, reply: Reply<PlayOutcome>) {
        if error.is_cancellation() || !self.session.is_current(generation) {
            self.respond(reply, Ok(PlayOutcome::Superseded));
            return;
        }

        if self.session.fail_request(generation) {
            self.grace.cancel();
            self.emit(CoordinatorEvent::PendingTrackChanged { track: None });
        }
        self.respond(reply, Err(error));
    }

    fn schedule_tail(&mut self, generation: u64, tail: Vec<Track>, token: CancellationToken) {
        let resolver = self.debouncer.resolver().clone();
        let arbiter = self.arbiter.clone();
        let internal = self.internal_tx.clone();

        self.debouncer.schedule_tail(async move {
            let appended = async {
                let resolved = resolve_tail(&resolver, &tail, &token).await?;
                let appended = append_tail(&arbiter, &resolved, &token).await?;
                Ok::<_, CueError>((appended, resolved.skipped))
            }
            .await;

            match appended {
                Ok((appended, skipped)) => {
                    let _ = internal.send(Internal::TailAppended {
                        generation,
                        appended,
                        skipped,
                    });
                }
                Err(CueError::Cancelled) => debug!("Queue tail for request {} superseded", generation),
                Err(e) => warn!("Queue tail for request {} failed: {}", generation, e),
            }
        });
    }

    fn arm_grace(&mut self, generation: u64) {
        let internal = self.internal_tx.clone();
        self.grace.schedule(self.config.grace_period(), async move {
            let _ = internal.send(Internal::GraceExpired { generation });
        });
    }

    /// Seek, then loop back once more if the target lands past the loop window
    async fn seek(&mut self, position: Duration) -> Result<()> {
        self.seek_backend(position).await?;
        if let Some(start) = self.apply_cue(position) {
            if let Err(e) = self.seek_backend(start).await {
                self.cue.loop_seek_failed();
                return Err(e);
            }
            self.apply_cue(start);
        }
        Ok(())
    }

    async fn seek_backend(&mut self, position: Duration) -> Result<()> {
        self.session.set_seeking(true);
        self.seek_seq += 1;

        if let Err(e) = self.arbiter.seek(position).await {
            self.seek_settle.cancel();
            self.session.set_seeking(false);
            return Err(e);
        }
        self.session.set_playback_time(position);

        let seq = self.seek_seq;
        let internal = self.internal_tx.clone();
        self.seek_settle.schedule(self.config.seek_settle(), async move {
            let _ = internal.send(Internal::SeekSettled { seq });
        });
        Ok(())
    }

    async fn poll(&mut self) {
        if self.session.polling_suppressed() {
            return;
        }
        let status = self.arbiter.status();
        self.apply_notification(&BackendNotification::from(&status.status))
            .await;
    }

    /// Shared path for polled and pushed notifications
    async fn apply_notification(&mut self, notification: &BackendNotification) {
        let outcome = self.session.apply_notification(notification);

        match &outcome {
            NotificationOutcome::Stale => {
                debug!(
                    "Discarding stale notification for {:?}",
                    notification.track.as_ref().map(|t| &t.identity)
                );
                return;
            }
            NotificationOutcome::Confirmed(track) => {
                self.grace.cancel();
                info!("Now playing {}", track.identity);
                self.emit(CoordinatorEvent::PendingTrackChanged { track: None });
            }
            NotificationOutcome::TrackChanged(_) | NotificationOutcome::Unchanged => {}
        }

        if outcome.changed_current() {
            self.emit(CoordinatorEvent::TrackChanged {
                track: self.session.current().cloned(),
            });
            if let Some(track) = outcome.started_track() {
                self.persist_last_played(track);
            }
            self.disarm_if_foreign();
        }

        if let Some(position) = notification.position {
            if let Some(start) = self.apply_cue(position) {
                if let Err(e) = self.seek_backend(start).await {
                    self.cue.loop_seek_failed();
                    self.surface(&e);
                } else {
                    self.apply_cue(start);
                }
            }
        }
    }

    fn persist_last_played(&self, track: &Track) {
        let history = Arc::clone(&self.history);
        let identity = track.identity.clone();
        tokio::spawn(async move {
            if let Err(e) = history.persist_last_played(&identity, Utc::now()).await {
                warn!("Failed to record last played {}: {}", identity, e);
            }
        });
    }

    fn arm_cue(&mut self, marker: Marker, cue_offset: Option<Duration>) {
        self.disarm_cue(DisarmReason::User);

        let state = self.cue.arm(marker, cue_offset);
        let event = CoordinatorEvent::CueArmed {
            marker_id: state.marker.id.clone(),
            start_ms: duration_ms(state.start_time),
            end_ms: duration_ms(state.end_time),
        };
        self.emit(event);
    }

    fn disarm_cue(&mut self, reason: DisarmReason) {
        if let Some(state) = self.cue.disarm() {
            debug!("Disarmed cue {} ({:?})", state.marker.id, reason);
            self.emit(CoordinatorEvent::CueDisarmed {
                marker_id: state.marker.id,
                reason,
            });
        }
    }

    /// Disarm when the current track is not the armed marker's track
    fn disarm_if_foreign(&mut self) {
        let foreign = match (self.cue.state(), self.session.current()) {
            (Some(state), Some(current)) => !current.is(&state.marker.track),
            (Some(_), None) => true,
            (None, _) => false,
        };
        if foreign {
            self.disarm_cue(DisarmReason::TrackChanged);
        }
    }

    /// Feed the cue engine, returning a loop seek target
    fn apply_cue(&mut self, time: Duration) -> Option<Duration> {
        let marker_id = {
            let state = self.cue.state()?;
            let current = self.session.current()?;
            if !current.is(&state.marker.track) {
                return None;
            }
            state.marker.id.clone()
        };

        let update = self.cue.update(time);

        if let Some(triggered) = update.triggered {
            self.haptics.pulse();
            self.emit(CoordinatorEvent::CueTriggered {
                marker_id: triggered,
            });
        }
        if let Some((marker_id, reason)) = update.disarmed {
            self.emit(CoordinatorEvent::CueDisarmed { marker_id, reason });
        }
        if update.seek_to.is_some() {
            self.emit(CoordinatorEvent::CueLooped { marker_id });
        }

        update.seek_to
    }

    async fn play_from_marker(&mut self, marker: Marker) -> Result<()> {
        match self.session.current() {
            Some(current) if current.is(&marker.track) => {}
            current => {
                return Err(CueError::invalid_input(format!(
                    "marker {} is for {}, current track is {}",
                    marker.id,
                    marker.track,
                    current.map_or_else(|| "none".to_string(), |t| t.identity.to_string())
                )));
            }
        }

        self.arm_cue(marker, None);
        let start = self
            .cue
            .state()
            .map_or(Duration::ZERO, |state| state.start_time);

        self.seek(start).await?;
        self.arbiter.play().await?;
        self.session.set_playing(true);
        Ok(())
    }

    /// Publish state, then answer the caller
    fn respond<T>(&mut self, reply: Reply<T>, result: Result<T>) {
        if let Err(e) = &result {
            self.surface(e);
        }
        self.publish();
        let _ = reply.send(result);
    }

    fn surface(&self, error: &CueError) {
        if error.is_cancellation() {
            return;
        }
        warn!("Playback operation failed: {}", error);
        self.emit(CoordinatorEvent::PlaybackFailed {
            message: error.to_string(),
        });
    }

    fn emit(&self, event: CoordinatorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&mut self) {
        let snapshot = self.session.snapshot(self.cue.progress());
        let was_playing = self.snapshot_tx.borrow().is_playing;

        if snapshot.is_playing != was_playing {
            self.emit(CoordinatorEvent::PlaybackStateChanged {
                is_playing: snapshot.is_playing,
            });
        }

        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
