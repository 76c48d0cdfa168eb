//! Track resolution
//!
//! Dispatches a candidate to the catalog or library lookup by identity kind
//! and tags the result with how it can be appended to a queue.

use crate::types::{ResolvedItem, ResolvedKind};
use cue_core::{CatalogResolver, CueError, LibraryResolver, Result, Track, TrackIdentity};
use std::sync::Arc;
use tracing::debug;

/// Resolves candidate tracks into playable items
#[derive(Clone)]
pub struct TrackResolver {
    catalog: Arc<dyn CatalogResolver>,
    library: Arc<dyn LibraryResolver>,
}

impl TrackResolver {
    /// Create a resolver over the two lookup services
    pub fn new(catalog: Arc<dyn CatalogResolver>, library: Arc<dyn LibraryResolver>) -> Self {
        Self { catalog, library }
    }

    /// Resolve `track` into a playable item
    ///
    /// Library items are looked up by persistent id first and by
    /// title/artist/duration when the id no longer matches anything.
    pub async fn resolve(&self, track: &Track) -> Result<ResolvedItem> {
        if !track.identity.is_resolvable() {
            return Err(CueError::InvalidItem(format!(
                "\"{}\" has no usable identifier",
                track.title
            )));
        }

        match &track.identity {
            TrackIdentity::Catalog(id) => {
                let resolved = self.catalog.resolve_catalog_item(id).await?;
                Ok(ResolvedItem {
                    track: resolved,
                    kind: ResolvedKind::Catalog,
                })
            }
            TrackIdentity::Library(id) => {
                let resolved = match track.library_query() {
                    Some(query) => match self.library.resolve_library_item(&query).await {
                        Ok(found) => Ok(found),
                        Err(e) if e.is_lookup_miss() => {
                            debug!("Library id {} missed, falling back to metadata", id);
                            self.library
                                .resolve_library_item(&track.metadata_query())
                                .await
                        }
                        Err(e) => Err(e),
                    },
                    None => Err(CueError::InvalidItem(track.identity.to_string())),
                };

                match resolved {
                    Ok(found) => Ok(ResolvedItem {
                        track: found,
                        kind: ResolvedKind::Library,
                    }),
                    Err(e) if e.is_lookup_miss() => {
                        Err(CueError::LibraryItemNotFound(track.title.clone()))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

impl std::fmt::Debug for TrackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackResolver").finish_non_exhaustive()
    }
}
