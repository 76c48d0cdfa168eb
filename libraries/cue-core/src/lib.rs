//! Cue Player Core
//!
//! Platform-agnostic domain types, traits, and error handling for Cue Player.
//!
//! This crate provides the value types shared by the playback coordination
//! core and the platform shells that embed it.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackIdentity`, `Marker`
//! - **Collaborator Traits**: `CatalogResolver`, `LibraryResolver`,
//!   `PlaybackHistory`, `HapticFeedback`
//! - **Error Handling**: Unified `CueError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cue_core::types::{CatalogId, Marker, Track, TrackIdentity};
//! use std::time::Duration;
//!
//! let track = Track::new(
//!     TrackIdentity::Catalog(CatalogId::new("1440833098")),
//!     "Clair de Lune",
//!     Duration::from_secs(300),
//! );
//!
//! // Start playback five seconds before the 1:30 mark
//! let marker = Marker::for_track(&track, Duration::from_secs(90))
//!     .unwrap()
//!     .with_cue_offset(Duration::from_secs(5));
//!
//! assert_eq!(marker.start_time(None), Duration::from_secs(85));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CueError, Result};
pub use traits::{
    CatalogResolver, HapticFeedback, LibraryResolver, NoopHaptics, NoopHistory, PlaybackHistory,
};

pub use types::{
    ArtworkRef, CatalogId, LibraryId, LibraryQuery, Marker, MarkerId, Track, TrackIdentity,
};
