//! Playback Session Model
//!
//! The single logical "what is currently loaded". Exactly one
//! [`PlaybackSession`] exists at a time; it is mutated only by the
//! orchestrator and replaced whenever a new track is requested.

use core_runtime::events::Transport;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Resolving,
    Playing,
    Paused,
    Error,
}

/// Volume as an integer percentage, clamped to `0..=100`.
///
/// UI surfaces hand over raw input (sliders, attribute strings); all
/// clamping and parsing happens here so adapters only ever see valid
/// percentages. Non-numeric input is treated as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: Volume = Volume(100);

    /// Clamp a raw integer into the valid range.
    pub fn clamp(raw: i64) -> Self {
        Self(raw.clamp(0, 100) as u8)
    }

    /// Parse raw UI input. Accepts integers and floats (floored);
    /// anything unparseable is 0.
    pub fn from_input(raw: &str) -> Self {
        let parsed = raw.trim().parse::<f64>().unwrap_or(0.0);
        if parsed.is_nan() {
            return Self(0);
        }
        Self::clamp(parsed.floor() as i64)
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::MAX
    }
}

/// The single logical playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    /// Opaque track identifier, unique per track.
    pub track_id: String,
    /// External reference used for resolution.
    pub track_ref: String,
    /// Which transport currently drives audio. `None` only while `Idle`.
    pub transport: Transport,
    /// Lifecycle status.
    pub status: PlaybackStatus,
    /// Current position in milliseconds.
    pub position_ms: u64,
    /// Stream duration in milliseconds, 0 while unknown.
    pub duration_ms: u64,
    /// Current volume.
    pub volume: Volume,
}

impl PlaybackSession {
    /// A fresh idle session with nothing loaded.
    pub fn idle() -> Self {
        Self {
            track_id: String::new(),
            track_ref: String::new(),
            transport: Transport::None,
            status: PlaybackStatus::Idle,
            position_ms: 0,
            duration_ms: 0,
            volume: Volume::default(),
        }
    }

    /// Whether any track has been loaded into this session.
    pub fn has_track(&self) -> bool {
        !self.track_id.is_empty()
    }

    /// Set the position, clamped so `position_ms <= duration_ms` whenever
    /// the duration is known.
    pub fn set_position(&mut self, position_ms: u64) {
        self.position_ms = if self.duration_ms > 0 {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        };
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::idle()
    }
}

/// Lock-free position/duration cell shared between the adapter event
/// pumps (writers) and the progress ticker (reader).
///
/// Host time updates arrive at element event frequency; routing them
/// through the session lock would contend with control operations for no
/// benefit.
#[derive(Debug, Default)]
pub struct PositionCell {
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
}

impl PositionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, position_ms: u64) {
        self.position_ms.store(position_ms, Ordering::Relaxed);
    }

    pub fn set_duration(&self, duration_ms: u64) {
        self.duration_ms.store(duration_ms, Ordering::Relaxed);
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::Relaxed)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms.load(Ordering::Relaxed)
    }

    /// Reset both values, e.g. when a new track is loaded.
    pub fn reset(&self) {
        self.position_ms.store(0, Ordering::Relaxed);
        self.duration_ms.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_clamps() {
        assert_eq!(Volume::clamp(-10), Volume::clamp(0));
        assert_eq!(Volume::clamp(150), Volume::clamp(100));
        assert_eq!(Volume::clamp(55).percent(), 55);
    }

    #[test]
    fn volume_parses_input() {
        assert_eq!(Volume::from_input("abc"), Volume::clamp(0));
        assert_eq!(Volume::from_input(""), Volume::clamp(0));
        assert_eq!(Volume::from_input("42"), Volume::clamp(42));
        assert_eq!(Volume::from_input(" 73.9 "), Volume::clamp(73));
        assert_eq!(Volume::from_input("-5"), Volume::clamp(0));
        assert_eq!(Volume::from_input("250"), Volume::clamp(100));
        assert_eq!(Volume::from_input("NaN"), Volume::clamp(0));
    }

    #[test]
    fn position_respects_known_duration() {
        let mut session = PlaybackSession::idle();
        session.duration_ms = 1000;
        session.set_position(5000);
        assert_eq!(session.position_ms, 1000);

        // Unknown duration: position is trusted as-is.
        session.duration_ms = 0;
        session.set_position(5000);
        assert_eq!(session.position_ms, 5000);
    }

    #[test]
    fn idle_session_invariant() {
        let session = PlaybackSession::idle();
        assert_eq!(session.status, PlaybackStatus::Idle);
        assert_eq!(session.transport, core_runtime::events::Transport::None);
        assert!(!session.has_track());
    }

    #[test]
    fn position_cell_round_trip() {
        let cell = PositionCell::new();
        cell.set_position(1234);
        cell.set_duration(60_000);
        assert_eq!(cell.position_ms(), 1234);
        assert_eq!(cell.duration_ms(), 60_000);

        cell.reset();
        assert_eq!(cell.position_ms(), 0);
        assert_eq!(cell.duration_ms(), 0);
    }
}
