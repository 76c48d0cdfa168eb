//! Debounced queue building
//!
//! Starting a queue happens in two phases:
//!
//! ```text
//! candidates: [A?, B, C, D, E]
//!              │   │  └──┴──┴── tail: resolved + appended after the debounce
//!              │   └─────────── head: first candidate that resolves, played now
//!              └─────────────── skipped (did not resolve)
//! ```
//!
//! A user tapping through songs fires many queue requests in a row. Each new
//! request cancels the previous one's in-flight lookups and its pending tail,
//! so only the last request ever reaches the backend queue.

use crate::arbiter::BackendArbiter;
use crate::resolver::TrackResolver;
use crate::timer::DelayedTask;
use crate::types::{QueueItem, Resolution, ResolvedItem};
use cue_core::{CueError, Result, Track};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The playable head of a candidate list
#[derive(Debug, Clone, PartialEq)]
pub struct HeadResolution {
    /// Index of the head among the candidates
    pub index: usize,

    /// Resolved head
    pub item: ResolvedItem,
}

impl HeadResolution {
    /// Candidates before the head that failed to resolve
    pub fn skipped(&self) -> usize {
        self.index
    }
}

/// Resolved tail, grouped for appending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailResolution {
    /// Items that can go into one batch append
    pub batch: Vec<ResolvedItem>,

    /// Items that must be appended one at a time
    pub singles: Vec<ResolvedItem>,

    /// Items that failed to resolve
    pub skipped: usize,
}

impl TailResolution {
    /// Group resolved queue items by how they can be appended
    pub fn from_items(items: Vec<QueueItem>) -> Self {
        let mut tail = Self::default();
        for item in items {
            match item.resolution {
                Resolution::Playable(resolved) if resolved.is_batch_appendable() => {
                    tail.batch.push(resolved);
                }
                Resolution::Playable(resolved) => tail.singles.push(resolved),
                Resolution::NotFound | Resolution::Unresolved => tail.skipped += 1,
            }
        }
        tail
    }

    /// Number of playable items
    pub fn len(&self) -> usize {
        self.batch.len() + self.singles.len()
    }

    /// Whether nothing resolved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns the in-flight queue request and its pending tail
///
/// Only one request and one tail timer exist at a time. Superseding cancels
/// both before handing out a fresh token.
#[derive(Debug)]
pub struct QueueDebouncer {
    resolver: TrackResolver,
    delay: Duration,
    tail: DelayedTask,
    token: CancellationToken,
}

impl QueueDebouncer {
    /// Create a debouncer that appends tails after `delay`
    pub fn new(resolver: TrackResolver, delay: Duration) -> Self {
        Self {
            resolver,
            delay,
            tail: DelayedTask::new(),
            token: CancellationToken::new(),
        }
    }

    /// Cancel the previous request and its tail, returning a token for the
    /// next one
    pub fn supersede(&mut self) -> CancellationToken {
        if self.tail.cancel() {
            debug!("Cancelled pending queue tail");
        }
        self.token.cancel();
        self.token = CancellationToken::new();
        self.token.clone()
    }

    /// Cancel everything without starting a new request
    pub fn cancel(&mut self) {
        self.tail.cancel();
        self.token.cancel();
    }

    /// Schedule the tail append behind the debounce delay
    pub fn schedule_tail<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tail.schedule(self.delay, task);
    }

    /// Whether a tail append is waiting or running
    pub fn tail_pending(&self) -> bool {
        self.tail.is_pending()
    }

    /// Resolver used for head and tail lookups
    pub fn resolver(&self) -> &TrackResolver {
        &self.resolver
    }
}

/// Resolve one track unless `token` is cancelled first
pub async fn resolve_cancellable(
    resolver: &TrackResolver,
    track: &Track,
    token: &CancellationToken,
) -> Result<ResolvedItem> {
    if token.is_cancelled() {
        return Err(CueError::Cancelled);
    }

    tokio::select! {
        biased;
        () = token.cancelled() => Err(CueError::Cancelled),
        result = resolver.resolve(track) => result,
    }
}

/// Find the first candidate that resolves
///
/// Lookup misses move on to the next candidate; any other failure (network,
/// authorization, cancellation) ends the search. A single candidate that
/// misses reports its own error rather than `NoValidItem`.
pub async fn resolve_head(
    resolver: &TrackResolver,
    candidates: &[Track],
    token: &CancellationToken,
) -> Result<HeadResolution> {
    if candidates.is_empty() {
        return Err(CueError::EmptyQueue);
    }

    let mut last_miss = None;
    for (index, candidate) in candidates.iter().enumerate() {
        match resolve_cancellable(resolver, candidate, token).await {
            Ok(item) => return Ok(HeadResolution { index, item }),
            Err(e) if e.is_lookup_miss() => {
                debug!("Queue head candidate {} unavailable: {}", candidate.identity, e);
                last_miss = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    match last_miss {
        Some(miss) if candidates.len() == 1 => Err(miss),
        _ => Err(CueError::NoValidItem(candidates.len())),
    }
}

/// Resolve every tail candidate, tolerating individual failures
pub async fn resolve_tail(
    resolver: &TrackResolver,
    candidates: &[Track],
    token: &CancellationToken,
) -> Result<TailResolution> {
    let mut items: Vec<QueueItem> = candidates.iter().cloned().map(QueueItem::new).collect();

    for item in &mut items {
        item.resolution = match resolve_cancellable(resolver, &item.track, token).await {
            Ok(resolved) => Resolution::Playable(resolved),
            Err(CueError::Cancelled) => return Err(CueError::Cancelled),
            Err(e) => {
                warn!("Skipping queue item {}: {}", item.track.identity, e);
                Resolution::NotFound
            }
        };
    }

    Ok(TailResolution::from_items(items))
}

/// Append a resolved tail to the authoritative backend
///
/// The batch goes first in a single call, then the singles in order.
/// Returns the number of items the backend accepted.
pub async fn append_tail(
    arbiter: &BackendArbiter,
    tail: &TailResolution,
    token: &CancellationToken,
) -> Result<usize> {
    let mut appended = 0;

    if !tail.batch.is_empty() {
        if token.is_cancelled() {
            return Err(CueError::Cancelled);
        }
        arbiter.append_batch(&tail.batch).await?;
        appended += tail.batch.len();
    }

    for item in &tail.singles {
        if token.is_cancelled() {
            return Err(CueError::Cancelled);
        }
        match arbiter.append(item).await {
            Ok(_) => appended += 1,
            Err(e) => warn!("Failed to append {}: {}", item.track.identity, e),
        }
    }

    Ok(appended)
}
