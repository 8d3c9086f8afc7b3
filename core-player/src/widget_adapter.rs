//! Widget Transport Adapter
//!
//! Drives the embeddable third-party widget. The widget's script API is
//! ready asynchronously (distinct from iframe load): commands issued
//! before readiness are buffered (at most one, newest wins) and flushed
//! once the library-ready event arrives.
//!
//! Event bindings go through a registry that enforces unbind-then-bind
//! per event kind, so a widget instance reused across track changes never
//! double-fires.

use crate::error::{PlayerError, Result};
use crate::session::{PositionCell, Volume};
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::widget::{
    WidgetCommand, WidgetEvent, WidgetEventKind, WidgetEventStream, WidgetHost, WidgetLoadOptions,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, Transport};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Options for mounting the widget transport.
#[derive(Debug, Clone, Copy)]
pub struct MountOptions {
    /// Position to resume from once the widget is ready.
    pub resume_ms: u64,
    /// Whether to begin playback automatically. On handshake platforms
    /// this is deferred behind the interaction prompt instead.
    pub autoplay: bool,
    /// Whether the iframe is visible (primary transport) or hidden
    /// (audio engine behind custom UI).
    pub visible: bool,
}

/// Tracks bound widget event kinds and enforces unbind-then-bind.
///
/// The registry always unbinds before binding; the widget instance may
/// carry bindings from before this adapter existed.
struct HandlerRegistry {
    bound: Mutex<HashSet<WidgetEventKind>>,
}

impl HandlerRegistry {
    fn new() -> Self {
        Self {
            bound: Mutex::new(HashSet::new()),
        }
    }

    async fn rebind_all(&self, host: &dyn WidgetHost) -> Result<()> {
        for kind in WidgetEventKind::ALL {
            host.unbind(kind).await.map_err(PlayerError::Bridge)?;
            host.bind(kind).await.map_err(PlayerError::Bridge)?;
            self.bound.lock().insert(kind);
        }
        Ok(())
    }

    async fn unbind_all(&self, host: &dyn WidgetHost) {
        let kinds: Vec<_> = self.bound.lock().drain().collect();
        for kind in kinds {
            if let Err(e) = host.unbind(kind).await {
                warn!("Unbind of {kind:?} failed: {e}");
            }
        }
    }
}

/// Adapter for the embeddable widget transport.
pub struct WidgetAdapter {
    host: Arc<dyn WidgetHost>,
    caps: PlatformCapabilities,
    bus: EventBus,
    cell: Arc<PositionCell>,
    track_id: String,
    registry: HandlerRegistry,
    ready: Arc<AtomicBool>,
    /// Single-slot buffer for a command issued before readiness.
    pending: Arc<Mutex<Option<WidgetCommand>>>,
    /// Set when autoplay is deferred behind the user-gesture handshake.
    handshake_pending: AtomicBool,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl WidgetAdapter {
    pub fn new(
        host: Arc<dyn WidgetHost>,
        caps: PlatformCapabilities,
        bus: EventBus,
        cell: Arc<PositionCell>,
        track_id: impl Into<String>,
    ) -> Self {
        Self {
            host,
            caps,
            bus,
            cell,
            track_id: track_id.into(),
            registry: HandlerRegistry::new(),
            ready: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(Mutex::new(None)),
            handshake_pending: AtomicBool::new(false),
            pump: Mutex::new(None),
        }
    }

    /// Whether mounting deferred autoplay behind the handshake prompt.
    pub fn handshake_pending(&self) -> bool {
        self.handshake_pending.load(Ordering::SeqCst)
    }

    /// Load a track into the widget and begin listening for its events.
    ///
    /// Returns as soon as the load is issued; readiness arrives
    /// asynchronously and any early command is buffered until then.
    #[instrument(skip(self, options), fields(track_id = %self.track_id))]
    pub async fn mount(&self, track_ref: &str, options: MountOptions) -> Result<()> {
        let events = self.host.subscribe_events().await?;

        self.registry.rebind_all(&*self.host).await?;

        self.host
            .set_visible(options.visible)
            .await
            .map_err(PlayerError::Bridge)?;

        let auto_play = options.autoplay && !self.caps.requires_widget_handshake;
        self.host
            .load(track_ref, WidgetLoadOptions { auto_play })
            .await
            .map_err(|e| PlayerError::WidgetFailed(e.to_string()))?;

        if options.autoplay && self.caps.requires_widget_handshake {
            self.handshake_pending.store(true, Ordering::SeqCst);
            debug!("Widget autoplay deferred behind user-gesture handshake");
        }

        self.cell.reset();
        self.spawn_pump(events, options.resume_ms);
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        self.dispatch(WidgetCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.dispatch(WidgetCommand::Pause).await
    }

    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        self.dispatch(WidgetCommand::Seek { position_ms }).await?;
        self.cell.set_position(position_ms);
        Ok(())
    }

    /// Apply a volume. Suppressed on hardware-volume platforms, matching
    /// the media transport.
    pub async fn set_volume(&self, volume: Volume) -> Result<()> {
        if !self.caps.supports_volume_api {
            debug!("Volume API unsupported on this platform, suppressing");
            return Ok(());
        }
        self.dispatch(WidgetCommand::SetVolume {
            percent: volume.percent(),
        })
        .await
    }

    /// Complete the user-gesture handshake: clears the pending flag and
    /// starts playback. Call from within the gesture handler.
    pub async fn complete_handshake(&self) -> Result<()> {
        self.handshake_pending.store(false, Ordering::SeqCst);
        self.play().await
    }

    /// Cancel the handshake prompt without starting playback.
    pub fn cancel_handshake(&self) {
        self.handshake_pending.store(false, Ordering::SeqCst);
    }

    /// Tear the transport down: the event pump is detached synchronously,
    /// widget-side bindings are removed, and the iframe is hidden.
    pub async fn unmount(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        self.registry.unbind_all(&*self.host).await;
        if let Err(e) = self.host.set_visible(false).await {
            warn!("Hiding widget failed: {}", e);
        }
        debug!(track_id = %self.track_id, "Widget transport torn down");
    }

    /// Issue a command now, or buffer it (single slot, newest wins) until
    /// the widget is ready.
    async fn dispatch(&self, command: WidgetCommand) -> Result<()> {
        if self.ready.load(Ordering::SeqCst) {
            return self
                .host
                .command(command)
                .await
                .map_err(|e| PlayerError::WidgetFailed(e.to_string()));
        }

        let replaced = self.pending.lock().replace(command);
        if replaced.is_some() {
            debug!("Replaced pending pre-ready widget command");
        }
        Ok(())
    }

    fn spawn_pump(&self, mut events: Box<dyn WidgetEventStream>, resume_ms: u64) {
        let bus = self.bus.clone();
        let cell = self.cell.clone();
        let host = self.host.clone();
        let ready = self.ready.clone();
        let pending = self.pending.clone();
        let track_id = self.track_id.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    WidgetEvent::Ready => {
                        ready.store(true, Ordering::SeqCst);

                        if resume_ms > 0 {
                            if let Err(e) = host
                                .command(WidgetCommand::Seek {
                                    position_ms: resume_ms,
                                })
                                .await
                            {
                                warn!("Widget resume seek failed: {}", e);
                            } else {
                                cell.set_position(resume_ms);
                            }
                        }

                        let buffered = pending.lock().take();
                        if let Some(command) = buffered {
                            if let Err(e) = host.command(command).await {
                                warn!("Flushing buffered widget command failed: {}", e);
                            }
                        }

                        bus.emit(CoreEvent::Playback(PlaybackEvent::Ready {
                            track_id: track_id.clone(),
                            transport: Transport::Widget,
                            duration_ms: cell.duration_ms(),
                        }))
                        .ok();
                    }
                    WidgetEvent::Play => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Resumed {
                            track_id: track_id.clone(),
                            position_ms: cell.position_ms(),
                        }))
                        .ok();
                    }
                    WidgetEvent::Pause => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Paused {
                            track_id: track_id.clone(),
                            position_ms: cell.position_ms(),
                        }))
                        .ok();
                    }
                    WidgetEvent::Progress {
                        position_ms,
                        duration_ms,
                    } => {
                        cell.set_position(position_ms);
                        if duration_ms > 0 {
                            cell.set_duration(duration_ms);
                        }
                    }
                    WidgetEvent::Finish => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Ended {
                            track_id: track_id.clone(),
                        }))
                        .ok();
                    }
                    WidgetEvent::Error { message } => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Error {
                            track_id: Some(track_id.clone()),
                            transport: Transport::Widget,
                            message,
                            recoverable: false,
                        }))
                        .ok();
                    }
                }
            }
        });

        *self.pump.lock() = Some(task);
    }
}
