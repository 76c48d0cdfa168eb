//! Core error types for Cue Player

use thiserror::Error;

/// Result type alias using `CueError`
pub type Result<T> = std::result::Result<T, CueError>;

/// Core error type for Cue Player
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    /// Catalog access was refused (no subscription, revoked permission)
    #[error("Not authorized to access the music catalog")]
    NotAuthorized,

    /// Catalog or library lookup miss
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A queue was requested with no candidates at all
    #[error("Queue is empty")]
    EmptyQueue,

    /// Every candidate of a queue failed to resolve
    #[error("No playable item among {0} candidates")]
    NoValidItem(usize),

    /// The item carries no identifier that can be resolved
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Local library lookup found nothing by id or by metadata
    #[error("Library item not found: {0}")]
    LibraryItemNotFound(String),

    /// Superseded by a newer request. Expected, never shown to the user.
    #[error("Operation cancelled")]
    Cancelled,

    /// Opaque failure reported by a playback backend
    #[error("Playback backend failure: {0}")]
    BackendFailure(String),

    /// Network error during a catalog lookup
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The coordinator task has shut down
    #[error("Playback coordinator is not running")]
    CoordinatorClosed,
}

impl CueError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a backend failure
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendFailure(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this is the expected outcome of supersession
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the error came from a lookup miss rather than a failure
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::LibraryItemNotFound(_) | Self::InvalidItem(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_distinguished() {
        assert!(CueError::Cancelled.is_cancellation());
        assert!(!CueError::EmptyQueue.is_cancellation());
    }

    #[test]
    fn lookup_misses() {
        assert!(CueError::not_found("Catalog item", "42").is_lookup_miss());
        assert!(CueError::LibraryItemNotFound("x".into()).is_lookup_miss());
        assert!(!CueError::network("timeout").is_lookup_miss());
        assert!(!CueError::NotAuthorized.is_lookup_miss());
    }

    #[test]
    fn display_includes_context() {
        let err = CueError::not_found("Catalog item", "1440833098");
        assert_eq!(err.to_string(), "Catalog item not found: 1440833098");
    }
}
