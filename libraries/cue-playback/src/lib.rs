//! Cue Player - Playback Coordination
//!
//! The part of Cue Player that decides what is playing, what is about to
//! play, which of two playback engines to talk to, and when a cue point has
//! been reached.
//!
//! This crate provides:
//! - Playback session state machine (current / pending / expected track)
//! - Debounced queue building (head now, tail after a delay)
//! - Backend arbitration between the system player and the app player
//! - Cue timing (window progress, at-most-once trigger, looping)
//! - A single-writer coordinator task tying it all together
//!
//! # Architecture
//!
//! `cue-playback` owns no audio and performs no lookups itself:
//! - Playback engines are provided via [`PlaybackBackend`]
//! - Catalog and library lookups via `cue_core::CatalogResolver` and
//!   `cue_core::LibraryResolver`
//! - History and haptics via `cue_core::PlaybackHistory` and
//!   `cue_core::HapticFeedback`
//!
//! All state lives in one tokio task. Callers hold a cloneable
//! [`CoordinatorHandle`], read state from [`SessionSnapshot`] and listen for
//! [`CoordinatorEvent`]s.
//!
//! # Example: Cue engine
//!
//! ```rust
//! use cue_core::{Marker, Track};
//! use cue_playback::CueEngine;
//! use std::time::Duration;
//!
//! let track = Track::catalog("1440833098", "Clair de Lune", Duration::from_secs(300));
//! let marker = Marker::for_track(&track, Duration::from_secs(90))
//!     .unwrap()
//!     .with_cue_offset(Duration::from_secs(5));
//!
//! let mut engine = CueEngine::new();
//! engine.arm(marker, None);
//!
//! let update = engine.update(Duration::from_millis(87_500));
//! assert!((update.progress - 0.5).abs() < f64::EPSILON);
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use cue_playback::{CoordinatorBuilder, CoordinatorConfig, PlaybackBackend};
//! use cue_core::{CatalogResolver, LibraryResolver, Result, Track};
//! use std::sync::Arc;
//!
//! async fn start(
//!     system: Arc<dyn PlaybackBackend>,
//!     app: Arc<dyn PlaybackBackend>,
//!     catalog: Arc<dyn CatalogResolver>,
//!     library: Arc<dyn LibraryResolver>,
//!     album: Vec<Track>,
//! ) -> Result<()> {
//!     let handle = CoordinatorBuilder::new(system, app, catalog, library)
//!         .config(CoordinatorConfig::load(None)?)
//!         .spawn()?;
//!
//!     handle.play_queue_with_debounce(album).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod arbiter;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod cue;
pub mod debouncer;
pub mod events;
pub mod resolver;
pub mod session;
pub mod timer;
pub mod types;

// Re-export main types
pub use arbiter::{BackendArbiter, PreviousAction, UnifiedStatus};
pub use backend::PlaybackBackend;
pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorBuilder, CoordinatorHandle};
pub use cue::{CueEngine, CueState, CueUpdate};
pub use debouncer::{HeadResolution, QueueDebouncer, TailResolution};
pub use events::{CoordinatorEvent, DisarmReason};
pub use resolver::TrackResolver;
pub use session::{NotificationOutcome, PlaybackSession, SessionPhase, SessionSnapshot};
pub use timer::DelayedTask;
pub use types::{
    BackendKind, BackendNotification, BackendState, BackendStatus, PlayOutcome, QueueItem,
    QueueOptions, RepeatMode, Resolution, ResolvedItem, ResolvedKind,
};
