//! Track domain type

use super::ids::{CatalogId, LibraryId, TrackIdentity};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Reference to artwork, resolved by the UI layer
///
/// Either a catalog URL template or an opaque local artwork key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkRef(String);

impl ArtworkRef {
    /// Create an artwork reference
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Get the inner reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Playable item
///
/// Immutable once constructed. Two tracks are equal iff their identities
/// match; metadata differences (a catalog refresh, a retagged file) do not
/// make a different track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Catalog or library identity
    pub identity: TrackIdentity,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Track duration
    pub duration: Duration,

    /// Artwork reference
    pub artwork: Option<ArtworkRef>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(identity: TrackIdentity, title: impl Into<String>, duration: Duration) -> Self {
        Self {
            identity,
            title: title.into(),
            artist: None,
            album: None,
            duration,
            artwork: None,
        }
    }

    /// Create a catalog track
    pub fn catalog(id: impl Into<String>, title: impl Into<String>, duration: Duration) -> Self {
        Self::new(TrackIdentity::Catalog(CatalogId::new(id)), title, duration)
    }

    /// Create a local library track
    pub fn library(id: u64, title: impl Into<String>, duration: Duration) -> Self {
        Self::new(TrackIdentity::Library(LibraryId::new(id)), title, duration)
    }

    /// Set the artist
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set the album
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the artwork reference
    #[must_use]
    pub fn with_artwork(mut self, artwork: ArtworkRef) -> Self {
        self.artwork = Some(artwork);
        self
    }

    /// Whether this track and `identity` name the same item
    pub fn is(&self, identity: &TrackIdentity) -> bool {
        &self.identity == identity
    }

    /// Query used to find this track in the local library
    ///
    /// Returns `None` for catalog tracks.
    pub fn library_query(&self) -> Option<LibraryQuery> {
        match self.identity {
            TrackIdentity::Library(id) => Some(LibraryQuery::PersistentId(id)),
            TrackIdentity::Catalog(_) => None,
        }
    }

    /// Metadata fallback query for library lookups
    pub fn metadata_query(&self) -> LibraryQuery {
        LibraryQuery::Metadata {
            title: self.title.clone(),
            artist: self.artist.clone(),
            duration: self.duration,
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// Lookup key for the local library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LibraryQuery {
    /// Exact lookup by persistent id
    PersistentId(LibraryId),

    /// Fuzzy lookup when the persistent id changed (re-sync, re-import)
    Metadata {
        /// Track title
        title: String,
        /// Artist name
        artist: Option<String>,
        /// Expected duration
        duration: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_identity() {
        let a = Track::catalog("1", "Song", Duration::from_secs(200)).with_artist("A");
        let b = Track::catalog("1", "Song (Remastered)", Duration::from_secs(201));
        let c = Track::catalog("2", "Song", Duration::from_secs(200)).with_artist("A");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Track> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_catalog_and_library_never_equal() {
        let catalog = Track::catalog("5", "Song", Duration::from_secs(60));
        let library = Track::library(5, "Song", Duration::from_secs(60));
        assert_ne!(catalog, library);
    }

    #[test]
    fn test_library_queries() {
        let track = Track::library(99, "Nocturne", Duration::from_secs(240)).with_artist("Chopin");
        assert_eq!(
            track.library_query(),
            Some(LibraryQuery::PersistentId(LibraryId::new(99)))
        );
        assert_eq!(
            track.metadata_query(),
            LibraryQuery::Metadata {
                title: "Nocturne".to_string(),
                artist: Some("Chopin".to_string()),
                duration: Duration::from_secs(240),
            }
        );

        let catalog = Track::catalog("1", "Song", Duration::from_secs(60));
        assert!(catalog.library_query().is_none());
    }
}
