//! Domain types for Cue Player

mod ids;
mod marker;
mod track;

pub use ids::{CatalogId, LibraryId, MarkerId, TrackIdentity};
pub use marker::Marker;
pub use track::{ArtworkRef, LibraryQuery, Track};
