//! State Persistence Store
//!
//! Serializes the playback snapshot and listening preferences to the
//! durable [`SettingsStore`] bridge so a reload resumes where the
//! listener left off.
//!
//! Position writes are throttled to once per configured interval;
//! pause, track change, and page teardown write unconditionally. The
//! snapshot is read exactly once during initialization. Preferences
//! (shuffle/repeat/volume) persist independently and indefinitely,
//! untied to any single session.

use crate::error::{PlayerError, Result};
use crate::playlist::RepeatMode;
use crate::session::{PlaybackSession, PlaybackStatus, Volume};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use core_runtime::events::Transport;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Storage key for the session snapshot.
const SESSION_KEY: &str = "player.session";

/// Storage key for listening preferences.
const PREFS_KEY: &str = "player.prefs";

/// Snapshot of a playback session written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub track_id: String,
    pub track_ref: String,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub transport: Transport,
    pub is_playing: bool,
    /// Unix millis when the snapshot was written.
    pub saved_at_ms: i64,
}

impl PersistedState {
    /// Capture a snapshot of the given session.
    pub fn capture(session: &PlaybackSession, saved_at_ms: i64) -> Self {
        Self {
            track_id: session.track_id.clone(),
            track_ref: session.track_ref.clone(),
            position_ms: session.position_ms,
            duration_ms: session.duration_ms,
            transport: session.transport,
            is_playing: session.status == PlaybackStatus::Playing,
            saved_at_ms,
        }
    }
}

/// Listening preferences with a lifetime independent of any session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerPrefs {
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: Volume,
}

/// Durable store for the session snapshot and preferences.
pub struct PersistenceStore {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    /// Minimum interval between throttled writes.
    min_interval: Duration,
    /// Unix millis of the last successful throttled write.
    last_write_ms: AtomicI64,
}

impl PersistenceStore {
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>, min_interval: Duration) -> Self {
        Self {
            store,
            clock,
            min_interval,
            last_write_ms: AtomicI64::new(0),
        }
    }

    /// Throttled save: skipped when the previous write is more recent than
    /// the configured interval. Use for position progress.
    pub async fn save(&self, session: &PlaybackSession) -> Result<()> {
        let now_ms = self.clock.unix_timestamp_millis();
        let last = self.last_write_ms.load(Ordering::Relaxed);
        if now_ms - last < self.min_interval.as_millis() as i64 {
            return Ok(());
        }
        self.write_snapshot(session, now_ms).await
    }

    /// Unthrottled save for key transitions: pause, track change, page
    /// teardown.
    pub async fn save_now(&self, session: &PlaybackSession) -> Result<()> {
        let now_ms = self.clock.unix_timestamp_millis();
        self.write_snapshot(session, now_ms).await
    }

    /// Read the snapshot. Corrupt or unparseable stored state is treated
    /// as absent: the player fails open to idle, never crashes on stale
    /// storage.
    pub async fn load(&self) -> Option<PersistedState> {
        let raw = match self.store.get_string(SESSION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) if !state.track_ref.is_empty() => Some(state),
            Ok(_) => {
                debug!("Persisted session has no track, ignoring");
                None
            }
            Err(e) => {
                debug!("Persisted session is corrupt, ignoring: {}", e);
                None
            }
        }
    }

    /// Remove the snapshot (e.g. after the referenced track resolved as
    /// deleted).
    pub async fn clear(&self) -> Result<()> {
        self.store
            .delete(SESSION_KEY)
            .await
            .map_err(|e| PlayerError::Persistence(e.to_string()))
    }

    /// Persist listening preferences. Unthrottled; preference changes are
    /// rare and user-initiated.
    pub async fn save_prefs(&self, prefs: &PlayerPrefs) -> Result<()> {
        let serialized = serde_json::to_string(prefs)
            .map_err(|e| PlayerError::Persistence(e.to_string()))?;
        self.store
            .set_string(PREFS_KEY, &serialized)
            .await
            .map_err(|e| PlayerError::Persistence(e.to_string()))
    }

    /// Read listening preferences, falling back to defaults on absence or
    /// corruption.
    pub async fn load_prefs(&self) -> PlayerPrefs {
        match self.store.get_string(PREFS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!("Persisted prefs are corrupt, using defaults: {}", e);
                PlayerPrefs::default()
            }),
            Ok(None) => PlayerPrefs::default(),
            Err(e) => {
                warn!("Failed to read prefs: {}", e);
                PlayerPrefs::default()
            }
        }
    }

    async fn write_snapshot(&self, session: &PlaybackSession, now_ms: i64) -> Result<()> {
        if !session.has_track() {
            return self.clear().await;
        }

        let snapshot = PersistedState::capture(session, now_ms);
        let serialized = serde_json::to_string(&snapshot)
            .map_err(|e| PlayerError::Persistence(e.to_string()))?;

        self.store
            .set_string(SESSION_KEY, &serialized)
            .await
            .map_err(|e| PlayerError::Persistence(e.to_string()))?;

        self.last_write_ms.store(now_ms, Ordering::Relaxed);
        Ok(())
    }
}
