//! UI Sync Layer
//!
//! Renders orchestrator state into a view model the host can paint:
//! play/pause icon, progress ratio, time labels, title/artist, per-track
//! now-playing exclusivity, and the responsive row switch.
//!
//! The model subscribes to events only; it never calls into adapters and
//! never owns playback state. It is correct before any session exists:
//! the initial state renders all zeros and never panics.

use core_runtime::events::{CoreEvent, EventBus, NoticeEvent, PlaybackEvent, RecvError};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// What the main transport button should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIcon {
    Play,
    Pause,
}

/// Renderable view of the player.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// The track currently loaded, if any. Only this track's row renders
    /// a playing indicator.
    pub active_track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// `m:ss` elapsed label, floor semantics.
    pub elapsed_label: String,
    /// `m:ss` duration label, `0:00` while unknown.
    pub duration_label: String,
    /// Progress in `0.0..=1.0`, 0 while the duration is unknown.
    pub progress_ratio: f32,
    /// Whether the layout is in compact rows (below the breakpoint).
    pub compact_rows: bool,
    /// Whether volume affordances should render at all.
    pub volume_visible: bool,
    /// Latest notice to surface, if any.
    pub notice: Option<NoticeEvent>,
}

impl UiState {
    fn zero(volume_visible: bool) -> Self {
        Self {
            active_track_id: None,
            title: None,
            artist: None,
            playing: false,
            position_ms: 0,
            duration_ms: 0,
            elapsed_label: format_timestamp(0),
            duration_label: format_timestamp(0),
            progress_ratio: 0.0,
            compact_rows: false,
            volume_visible,
            notice: None,
        }
    }
}

/// Event-fed view model.
pub struct UiModel {
    state: UiState,
    breakpoint_px: u32,
}

impl UiModel {
    /// A model rendering the all-zero idle state.
    pub fn new(breakpoint_px: u32, volume_visible: bool) -> Self {
        Self {
            state: UiState::zero(volume_visible),
            breakpoint_px,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Whether the given track's row should render as playing. Exactly
    /// one track can ever satisfy this.
    pub fn is_track_playing(&self, track_id: &str) -> bool {
        self.state.playing && self.state.active_track_id.as_deref() == Some(track_id)
    }

    /// Icon for a specific track row.
    pub fn icon_for(&self, track_id: &str) -> PlaybackIcon {
        if self.is_track_playing(track_id) {
            PlaybackIcon::Pause
        } else {
            PlaybackIcon::Play
        }
    }

    /// Icon for the main transport button.
    pub fn transport_icon(&self) -> PlaybackIcon {
        if self.state.playing {
            PlaybackIcon::Pause
        } else {
            PlaybackIcon::Play
        }
    }

    /// Responsive row switch at the fixed breakpoint.
    pub fn set_viewport_width(&mut self, width_px: u32) {
        self.state.compact_rows = width_px < self.breakpoint_px;
    }

    /// Clear the surfaced notice (e.g. after the host rendered it).
    pub fn dismiss_notice(&mut self) {
        self.state.notice = None;
    }

    /// Fold one event into the view.
    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::Playback(playback) => self.apply_playback(playback),
            CoreEvent::Notice(notice) => {
                self.state.notice = Some(notice.clone());
            }
        }
    }

    fn apply_playback(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Ready {
                track_id,
                duration_ms,
                ..
            } => {
                self.state.active_track_id = Some(track_id.clone());
                self.set_progress(self.state.position_ms, *duration_ms);
            }
            PlaybackEvent::Started {
                track_id,
                title,
                artist,
                ..
            } => {
                self.state.active_track_id = Some(track_id.clone());
                self.state.title = title.clone();
                self.state.artist = artist.clone();
                self.state.playing = true;
                self.state.notice = None;
            }
            PlaybackEvent::Paused { position_ms, .. } => {
                self.state.playing = false;
                self.set_progress(*position_ms, self.state.duration_ms);
            }
            PlaybackEvent::Resumed { position_ms, .. } => {
                self.state.playing = true;
                self.set_progress(*position_ms, self.state.duration_ms);
            }
            PlaybackEvent::PositionChanged {
                position_ms,
                duration_ms,
                ..
            } => {
                self.set_progress(*position_ms, *duration_ms);
            }
            PlaybackEvent::Ended { .. } => {
                self.state.playing = false;
                self.set_progress(self.state.duration_ms, self.state.duration_ms);
            }
            PlaybackEvent::Fallback { .. } => {
                // Transport swap is invisible to the listener.
            }
            PlaybackEvent::Stopped { .. } => {
                let volume_visible = self.state.volume_visible;
                let compact = self.state.compact_rows;
                self.state = UiState::zero(volume_visible);
                self.state.compact_rows = compact;
            }
            PlaybackEvent::Error { .. } => {
                self.state.playing = false;
            }
        }
    }

    fn set_progress(&mut self, position_ms: u64, duration_ms: u64) {
        let position_ms = if duration_ms > 0 {
            position_ms.min(duration_ms)
        } else {
            position_ms
        };
        self.state.position_ms = position_ms;
        self.state.duration_ms = duration_ms;
        self.state.elapsed_label = format_timestamp(position_ms);
        self.state.duration_label = format_timestamp(duration_ms);
        self.state.progress_ratio = if duration_ms > 0 {
            position_ms as f32 / duration_ms as f32
        } else {
            0.0
        };
    }
}

/// Format milliseconds as `m:ss` with floor semantics.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Format a possibly-negative millisecond value; negatives render as
/// `0:00` rather than ever showing a negative label.
pub fn format_timestamp_signed(ms: i64) -> String {
    format_timestamp(ms.max(0) as u64)
}

/// Spawn a task feeding bus events into a shared model.
pub fn spawn_ui_sync(bus: &EventBus, model: Arc<RwLock<UiModel>>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => model.write().apply(&event),
                Err(RecvError::Lagged(missed)) => {
                    debug!("UI sync lagged behind {missed} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
