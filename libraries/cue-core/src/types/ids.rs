//! ID types for Cue Player entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Remote catalog item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(String);

impl CatalogId {
    /// Create a new catalog ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local library persistent identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryId(u64);

impl LibraryId {
    /// Create a new library ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw persistent id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    /// Create a new marker ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random marker ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a playable item
///
/// A track comes either from the remote catalog or from the local library.
/// Equality of tracks is equality of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TrackIdentity {
    /// Remote catalog item
    Catalog(CatalogId),

    /// Local library item
    Library(LibraryId),
}

impl TrackIdentity {
    /// Whether the identity carries something a lookup can use
    pub fn is_resolvable(&self) -> bool {
        match self {
            Self::Catalog(id) => !id.as_str().trim().is_empty(),
            Self::Library(id) => id.get() != 0,
        }
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(id) => write!(f, "catalog:{id}"),
            Self::Library(id) => write!(f, "library:{id}"),
        }
    }
}
