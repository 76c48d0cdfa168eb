//! Marker (cue point) domain type

use super::ids::{MarkerId, TrackIdentity};
use super::track::Track;
use crate::error::{CueError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cue point inside a track
///
/// Playback resumes `cue_offset` before `timestamp`. The offset is not
/// validated against the timestamp; the computed start time is clamped to
/// zero instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Unique marker identifier
    pub id: MarkerId,

    /// Track this marker belongs to
    pub track: TrackIdentity,

    /// Position of the cue within the track
    pub timestamp: Duration,

    /// How long before `timestamp` playback should begin
    pub cue_offset: Duration,

    /// Replay window after `timestamp` before looping back, if looping
    pub loop_duration: Option<Duration>,

    /// Display label
    pub label: Option<String>,

    /// When the marker was created
    pub created_at: DateTime<Utc>,
}

impl Marker {
    /// Create a marker without validating against track duration
    pub fn new(track: TrackIdentity, timestamp: Duration) -> Self {
        Self {
            id: MarkerId::generate(),
            track,
            timestamp,
            cue_offset: Duration::ZERO,
            loop_duration: None,
            label: None,
            created_at: Utc::now(),
        }
    }

    /// Create a marker on `track`, checking the timestamp lies within it
    pub fn for_track(track: &Track, timestamp: Duration) -> Result<Self> {
        Self::check_timestamp(track, timestamp)?;
        Ok(Self::new(track.identity.clone(), timestamp))
    }

    /// Set the cue offset
    #[must_use]
    pub fn with_cue_offset(mut self, cue_offset: Duration) -> Self {
        self.cue_offset = cue_offset;
        self
    }

    /// Enable looping for `loop_duration` past the timestamp
    #[must_use]
    pub fn with_loop(mut self, loop_duration: Duration) -> Self {
        self.loop_duration = Some(loop_duration);
        self
    }

    /// Set the display label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Move the marker, checking the new timestamp against the track
    pub fn set_timestamp(&mut self, track: &Track, timestamp: Duration) -> Result<()> {
        if !track.is(&self.track) {
            return Err(CueError::invalid_input(format!(
                "marker {} belongs to {}, not {}",
                self.id, self.track, track.identity
            )));
        }
        Self::check_timestamp(track, timestamp)?;
        self.timestamp = timestamp;
        Ok(())
    }

    /// Change the cue offset
    pub fn set_cue_offset(&mut self, cue_offset: Duration) {
        self.cue_offset = cue_offset;
    }

    /// Change or clear the loop duration
    pub fn set_loop_duration(&mut self, loop_duration: Option<Duration>) {
        self.loop_duration = loop_duration;
    }

    /// Change or clear the label
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Playback start time: `max(0, timestamp - offset)`
    ///
    /// `cue_offset_override` replaces the marker's own offset when given.
    pub fn start_time(&self, cue_offset_override: Option<Duration>) -> Duration {
        let offset = cue_offset_override.unwrap_or(self.cue_offset);
        self.timestamp.saturating_sub(offset)
    }

    /// End of the cue window (the timestamp itself)
    pub fn end_time(&self) -> Duration {
        self.timestamp
    }

    /// Whether the marker loops
    pub fn loops(&self) -> bool {
        self.loop_duration.is_some_and(|d| !d.is_zero())
    }

    fn check_timestamp(track: &Track, timestamp: Duration) -> Result<()> {
        if timestamp > track.duration {
            return Err(CueError::invalid_input(format!(
                "timestamp {:.3}s is past the end of \"{}\" ({:.3}s)",
                timestamp.as_secs_f64(),
                track.title,
                track.duration.as_secs_f64()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track::catalog("1", "Song", Duration::from_secs(180))
    }

    #[test]
    fn test_start_time_subtracts_offset() {
        let marker = Marker::for_track(&track(), Duration::from_secs(90))
            .unwrap()
            .with_cue_offset(Duration::from_secs(5));
        assert_eq!(marker.start_time(None), Duration::from_secs(85));
        assert_eq!(marker.end_time(), Duration::from_secs(90));
    }

    #[test]
    fn test_start_time_clamps_to_zero() {
        let marker = Marker::for_track(&track(), Duration::from_secs(5))
            .unwrap()
            .with_cue_offset(Duration::from_secs(10));
        assert_eq!(marker.start_time(None), Duration::ZERO);
    }

    #[test]
    fn test_offset_override() {
        let marker = Marker::for_track(&track(), Duration::from_secs(60))
            .unwrap()
            .with_cue_offset(Duration::from_secs(5));
        assert_eq!(
            marker.start_time(Some(Duration::from_secs(20))),
            Duration::from_secs(40)
        );
    }

    #[test]
    fn test_timestamp_past_end_rejected() {
        let result = Marker::for_track(&track(), Duration::from_secs(181));
        assert!(matches!(result, Err(CueError::InvalidInput(_))));

        // The very end is allowed
        assert!(Marker::for_track(&track(), Duration::from_secs(180)).is_ok());
    }

    #[test]
    fn test_set_timestamp_checks_owner() {
        let mut marker = Marker::for_track(&track(), Duration::from_secs(10)).unwrap();
        let other = Track::catalog("2", "Other", Duration::from_secs(600));
        assert!(marker.set_timestamp(&other, Duration::from_secs(20)).is_err());
        assert!(marker.set_timestamp(&track(), Duration::from_secs(20)).is_ok());
        assert_eq!(marker.timestamp, Duration::from_secs(20));
    }

    #[test]
    fn test_zero_loop_does_not_loop() {
        let marker = Marker::new(track().identity, Duration::from_secs(30));
        assert!(!marker.loops());
        assert!(!marker.clone().with_loop(Duration::ZERO).loops());
        assert!(marker.with_loop(Duration::from_secs(4)).loops());
    }
}
