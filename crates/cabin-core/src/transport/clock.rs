//! Playback clock extrapolated between authoritative updates.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Track metadata as reported by the external player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    pub duration_ms: u64,
}

impl TrackInfo {
    pub fn new(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            artists: Vec::new(),
            duration_ms,
        }
    }

    /// Artist names joined for display.
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// Position of the current track, in milliseconds.
///
/// `position_ms` never exceeds `duration_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    track: TrackInfo,
    position_ms: u64,
    paused: bool,
    last_sync: Instant,
}

impl PlaybackClock {
    pub fn new(track: TrackInfo, position_ms: u64, paused: bool, now: Instant) -> Self {
        let position_ms = position_ms.min(track.duration_ms);
        Self {
            track,
            position_ms,
            paused,
            last_sync: now,
        }
    }

    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.track.duration_ms
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Wall-clock time of the last authoritative update.
    pub fn last_sync(&self) -> Instant {
        self.last_sync
    }

    pub fn at_end(&self) -> bool {
        self.position_ms >= self.track.duration_ms
    }

    /// Advance by `step_ms`, clamped to the track duration. Returns the new position.
    pub(crate) fn advance(&mut self, step_ms: u64) -> u64 {
        self.position_ms = self
            .position_ms
            .saturating_add(step_ms)
            .min(self.track.duration_ms);
        self.position_ms
    }

    pub fn elapsed(&self) -> String {
        format_time(self.position_ms)
    }

    pub fn total(&self) -> String {
        format_time(self.track.duration_ms)
    }
}

/// Format milliseconds as `m:ss`.
pub fn format_time(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
