//! # Stream Player Core Engine
//!
//! The playback engine: transport selection between a direct media
//! pipeline and an embeddable widget, automatic one-shot fallback,
//! deleted-track handling, durable resume state, and an event-driven UI
//! layer.
//!
//! ## Overview
//!
//! This crate contains:
//! - [`PlayerOrchestrator`](orchestrator::PlayerOrchestrator) - the state
//!   machine owning the session and the active transport
//! - [`MediaAdapter`](media_adapter::MediaAdapter) /
//!   [`WidgetAdapter`](widget_adapter::WidgetAdapter) - the two transport
//!   drivers over their bridge hosts
//! - [`PersistenceStore`](persistence::PersistenceStore) - throttled
//!   durable snapshots + listening preferences
//! - [`ProgressTicker`](ticker::ProgressTicker) - the owned progress
//!   timer
//! - [`UiModel`](ui_sync::UiModel) - the event-fed view model
//!
//! The host supplies the platform pieces through `bridge-traits` and the
//! resolution/auth collaborators through `provider-tracks` / `core-auth`.

pub mod error;
pub mod media_adapter;
pub mod orchestrator;
pub mod persistence;
pub mod playlist;
pub mod session;
pub mod ticker;
pub mod ui_sync;
pub mod widget_adapter;

pub use error::{PlayerError, Result};
pub use media_adapter::{MediaAdapter, StartSpec};
pub use orchestrator::{PlayerCommand, PlayerCommandSender, PlayerOrchestrator};
pub use persistence::{PersistedState, PersistenceStore, PlayerPrefs};
pub use playlist::{PlaylistContext, RepeatMode, TrackDescriptor};
pub use session::{PlaybackSession, PlaybackStatus, PositionCell, Volume};
pub use ticker::ProgressTicker;
pub use ui_sync::{format_timestamp, spawn_ui_sync, PlaybackIcon, UiModel, UiState};
pub use widget_adapter::{MountOptions, WidgetAdapter};
