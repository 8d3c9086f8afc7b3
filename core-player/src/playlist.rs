//! Playlist Context
//!
//! The ordered track list the next/prev controls walk. The host page owns
//! the actual track list; this context is re-synced from it, not owned.
//! Shuffle recomputes the derived order as a permutation of all known
//! track ids; toggling shuffle off restores natural document order.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Repeat behavior for next/prev boundary handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Stop at playlist boundaries.
    #[default]
    None,
    /// Wrap around at playlist boundaries.
    All,
}

/// A track as the host page describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Opaque track identifier.
    pub track_id: String,
    /// External reference used for resolution.
    pub track_ref: String,
    /// Display title, when the host knows it.
    #[serde(default)]
    pub title: Option<String>,
    /// Display artist, when the host knows it.
    #[serde(default)]
    pub artist: Option<String>,
}

impl TrackDescriptor {
    pub fn new(track_id: impl Into<String>, track_ref: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            track_ref: track_ref.into(),
            title: None,
            artist: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }
}

/// Ordered sequence of tracks plus shuffle/repeat state and the derived
/// play order.
#[derive(Debug, Clone, Default)]
pub struct PlaylistContext {
    /// Tracks in natural document order.
    tracks: Vec<TrackDescriptor>,
    /// Whether shuffle is active.
    shuffle: bool,
    /// Boundary behavior.
    repeat: RepeatMode,
    /// Derived order of track ids used by next/prev.
    order: Vec<String>,
}

impl PlaylistContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the track list from the host, preserving shuffle/repeat
    /// state. With shuffle active the permutation is recomputed over the
    /// new track set.
    pub fn sync(&mut self, tracks: Vec<TrackDescriptor>) {
        self.tracks = tracks;
        self.rebuild_order();
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    /// Current derived order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Toggle shuffle. On: the order becomes a random permutation of all
    /// known track ids. Off: natural document order is restored.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.rebuild_order();
        self.shuffle
    }

    /// Explicitly set shuffle (used when restoring persisted preferences).
    pub fn set_shuffle(&mut self, shuffle: bool) {
        if self.shuffle != shuffle {
            self.shuffle = shuffle;
            self.rebuild_order();
        }
    }

    /// Look up a descriptor by track id.
    pub fn find(&self, track_id: &str) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }

    /// Look up a descriptor by track reference.
    pub fn find_by_ref(&self, track_ref: &str) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|t| t.track_ref == track_ref)
    }

    /// First track in the current order, if any.
    pub fn first(&self) -> Option<&TrackDescriptor> {
        self.order.first().and_then(|id| self.find(id))
    }

    /// The track following `track_id` in the current order. Wraps only
    /// when repeat is [`RepeatMode::All`].
    pub fn next_after(&self, track_id: &str) -> Option<&TrackDescriptor> {
        self.neighbor(track_id, 1)
    }

    /// The track preceding `track_id` in the current order. Wraps only
    /// when repeat is [`RepeatMode::All`].
    pub fn prev_before(&self, track_id: &str) -> Option<&TrackDescriptor> {
        self.neighbor(track_id, -1)
    }

    fn neighbor(&self, track_id: &str, step: i64) -> Option<&TrackDescriptor> {
        let len = self.order.len() as i64;
        if len == 0 {
            return None;
        }
        let index = self.order.iter().position(|id| id == track_id)? as i64;
        let target = index + step;

        let target = if (0..len).contains(&target) {
            target
        } else if self.repeat == RepeatMode::All {
            target.rem_euclid(len)
        } else {
            return None;
        };

        self.find(&self.order[target as usize])
    }

    fn rebuild_order(&mut self) {
        self.order = self.tracks.iter().map(|t| t.track_id.clone()).collect();
        if self.shuffle {
            self.order.shuffle(&mut rand::thread_rng());
        }
    }
}
