//! Embeddable Widget Host Abstraction
//!
//! Wraps an iframe-embedded third-party player widget and its script API.
//! The widget's readiness is asynchronous and signalled by a library-level
//! ready event distinct from the iframe's own load; the core must not issue
//! playback commands before that signal.
//!
//! The script API delivers events only for event kinds that have been
//! explicitly bound. Binding the same kind twice double-fires on some
//! widget versions, so the core funnels every bind through a registry that
//! unbinds first (see the widget adapter in `core-player`).

use async_trait::async_trait;

use crate::error::Result;

/// Event kinds the widget script API can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetEventKind {
    Ready,
    Play,
    Pause,
    Progress,
    Finish,
    Error,
}

impl WidgetEventKind {
    /// The full set of bindable kinds, in binding order.
    pub const ALL: [WidgetEventKind; 6] = [
        WidgetEventKind::Ready,
        WidgetEventKind::Play,
        WidgetEventKind::Pause,
        WidgetEventKind::Progress,
        WidgetEventKind::Finish,
        WidgetEventKind::Error,
    ];
}

/// Events delivered by the widget for bound kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The widget library finished initializing and accepts commands.
    Ready,
    Play,
    Pause,
    Progress { position_ms: u64, duration_ms: u64 },
    Finish,
    Error { message: String },
}

impl WidgetEvent {
    pub fn kind(&self) -> WidgetEventKind {
        match self {
            WidgetEvent::Ready => WidgetEventKind::Ready,
            WidgetEvent::Play => WidgetEventKind::Play,
            WidgetEvent::Pause => WidgetEventKind::Pause,
            WidgetEvent::Progress { .. } => WidgetEventKind::Progress,
            WidgetEvent::Finish => WidgetEventKind::Finish,
            WidgetEvent::Error { .. } => WidgetEventKind::Error,
        }
    }
}

/// Commands issued to a ready widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetCommand {
    Play,
    Pause,
    Seek { position_ms: u64 },
    SetVolume { percent: u8 },
}

/// Options for loading a track into the widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidgetLoadOptions {
    /// Ask the widget to begin playback once loaded. Ignored on platforms
    /// that require a user-gesture handshake; the core handles those by
    /// surfacing a prompt instead.
    pub auto_play: bool,
}

/// Stream of widget events for bound kinds.
#[async_trait]
pub trait WidgetEventStream: Send {
    /// Next event, or `None` once the widget is unloaded.
    async fn next(&mut self) -> Option<WidgetEvent>;
}

/// Host-owned embeddable widget.
#[async_trait]
pub trait WidgetHost: Send + Sync {
    /// Load a track into the widget. Safe to call on an already-loaded
    /// widget; the instance is reused across track changes.
    async fn load(&self, track_ref: &str, options: WidgetLoadOptions) -> Result<()>;

    /// Bind an event kind so the widget starts delivering it.
    async fn bind(&self, kind: WidgetEventKind) -> Result<()>;

    /// Unbind an event kind. Unbinding a kind that is not bound is a no-op.
    async fn unbind(&self, kind: WidgetEventKind) -> Result<()>;

    /// Issue a playback command. Callers must wait for [`WidgetEvent::Ready`]
    /// before the first command.
    async fn command(&self, command: WidgetCommand) -> Result<()>;

    /// Show or hide the underlying iframe. Visible when the widget is the
    /// primary transport with its own controls, hidden when it is purely an
    /// audio engine behind custom UI.
    async fn set_visible(&self, visible: bool) -> Result<()>;

    /// Subscribe to widget events.
    async fn subscribe_events(&self) -> Result<Box<dyn WidgetEventStream>>;
}
