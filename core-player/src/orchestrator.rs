//! # Playback Orchestrator
//!
//! The state machine at the center of the playback engine. Owns the
//! single [`PlaybackSession`], the playlist context, and (as a tagged
//! union) whichever transport adapter is currently attached.
//!
//! ## State machine
//!
//! ```text
//! Idle ──load──> Resolving ──playable──> PlayingMedia ⇄ Paused
//!                    │                        │
//!                    │ deleted                │ start failure (once)
//!                    ▼                        ▼
//!                  Idle              FallbackToWidget ──> PlayingWidget ⇄ Paused
//! ```
//!
//! Any state returns to `Idle` on explicit stop or track change. Exactly
//! one `load_and_play` sequence is in flight at a time: a newer call
//! supersedes an older one by tearing down whatever was mid-setup, and
//! stale resolution results are discarded via a load generation counter.
//!
//! ## Workflow
//!
//! 1. Check the login gate; unauthenticated viewers get a gate notice and
//!    no resolver call
//! 2. Tear down the active transport, enter `Resolving`, resolve the ref
//! 3. Deleted → user notice, persisted state cleared, back to `Idle`
//! 4. Playable → transport selection: media when an API credential exists
//!    and the platform needs no widget handshake, widget otherwise
//! 5. Media start failure → tear down fully, mount the widget at the same
//!    resume position, at most once per load
//! 6. Success → progress ticker starts, state persists, events flow

use crate::error::Result;
use crate::media_adapter::{MediaAdapter, StartSpec};
use crate::persistence::{PersistenceStore, PlayerPrefs};
use crate::playlist::{PlaylistContext, RepeatMode, TrackDescriptor};
use crate::session::{PlaybackSession, PlaybackStatus, PositionCell, Volume};
use crate::ticker::{ProgressTicker, TickerShared};
use crate::widget_adapter::{MountOptions, WidgetAdapter};
use bridge_traits::http::AuthHeaderProvider;
use bridge_traits::lifecycle::PageVisibility;
use bridge_traits::media::MediaElementHost;
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::resolver::{PlayableStream, Resolution, TrackResolver};
use bridge_traits::widget::WidgetHost;
use core_auth::LoginGate;
use core_runtime::config::{CoreConfig, PlayerTuning};
use core_runtime::events::{
    CoreEvent, EventBus, NoticeEvent, PlaybackEvent, RecvError, Transport,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// The transport currently owning the audio output.
///
/// Switching variants always tears the previous one down first, so the
/// single media element and the single iframe are mutually exclusive by
/// construction.
enum ActiveTransport {
    None,
    Media(MediaAdapter),
    Widget(WidgetAdapter),
}

/// Commands other page regions may send without coupling to the
/// orchestrator's internals.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Request playback of a specific track reference.
    Play { track_ref: String },
    TogglePlayPause,
    Next,
    Prev,
    SeekMs(u64),
    /// Raw volume input from a UI surface; parsed and clamped internally.
    SetVolumeInput(String),
    ToggleShuffle,
    SetRepeat(RepeatMode),
    Stop,
    CompleteHandshake,
    CancelHandshake,
}

/// Cloneable sender for [`PlayerCommand`]s.
#[derive(Clone)]
pub struct PlayerCommandSender {
    tx: mpsc::Sender<PlayerCommand>,
}

impl PlayerCommandSender {
    /// Send a command; dropped silently if the orchestrator shut down.
    pub async fn send(&self, command: PlayerCommand) {
        if self.tx.send(command).await.is_err() {
            warn!("Player command dropped: orchestrator stopped");
        }
    }

    /// Convenience for the "play requested from elsewhere" pattern.
    pub async fn request_play(&self, track_ref: impl Into<String>) {
        self.send(PlayerCommand::Play {
            track_ref: track_ref.into(),
        })
        .await;
    }
}

/// The playback orchestrator. See the module docs for the state machine.
pub struct PlayerOrchestrator {
    caps: PlatformCapabilities,
    tuning: PlayerTuning,

    resolver: Arc<dyn TrackResolver>,
    gate: Arc<dyn LoginGate>,
    headers: Arc<dyn AuthHeaderProvider>,

    media_host: Arc<dyn MediaElementHost>,
    widget_host: Arc<dyn WidgetHost>,

    bus: EventBus,
    persistence: Arc<PersistenceStore>,

    session: Arc<RwLock<PlaybackSession>>,
    playlist: Arc<RwLock<PlaylistContext>>,
    active: AsyncMutex<ActiveTransport>,
    cell: Arc<PositionCell>,
    ticker: ProgressTicker,

    /// Monotonic counter identifying the newest `load_and_play` call.
    /// Await points compare against it and discard superseded work.
    load_generation: AtomicU64,

    /// Snapshot restored from storage, consumed by [`resume`](Self::resume).
    pending_resume: parking_lot::Mutex<Option<crate::persistence::PersistedState>>,

    config: CoreConfig,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl PlayerOrchestrator {
    /// Build an orchestrator from validated configuration and the
    /// resolution/auth collaborators.
    pub fn new(
        config: CoreConfig,
        resolver: Arc<dyn TrackResolver>,
        gate: Arc<dyn LoginGate>,
        headers: Arc<dyn AuthHeaderProvider>,
    ) -> Arc<Self> {
        let tuning = config.tuning.clone();
        let bus = EventBus::new(tuning.event_buffer);
        let persistence = Arc::new(PersistenceStore::new(
            config.settings_store.clone(),
            config.clock.clone(),
            tuning.persist_interval,
        ));

        Arc::new(Self {
            caps: config.capabilities,
            ticker: ProgressTicker::new(tuning.ticker_period),
            tuning,
            resolver,
            gate,
            headers,
            media_host: config.media_host.clone(),
            widget_host: config.widget_host.clone(),
            bus,
            persistence,
            session: Arc::new(RwLock::new(PlaybackSession::idle())),
            playlist: Arc::new(RwLock::new(PlaylistContext::new())),
            active: AsyncMutex::new(ActiveTransport::None),
            cell: Arc::new(PositionCell::new()),
            load_generation: AtomicU64::new(0),
            pending_resume: parking_lot::Mutex::new(None),
            config,
            tasks: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// The event bus carrying playback events and notices.
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> PlaybackSession {
        self.session.read().clone()
    }

    /// Whether the UI should render volume affordances at all.
    pub fn volume_controllable(&self) -> bool {
        self.caps.supports_volume_api
    }

    /// Replace the playlist from the host track list.
    pub fn sync_playlist(&self, tracks: Vec<TrackDescriptor>) {
        self.playlist.write().sync(tracks);
    }

    /// Restore persisted preferences and read the resume snapshot. Called
    /// once during startup, before any playback.
    pub async fn initialize(&self) -> Result<()> {
        let prefs = self.persistence.load_prefs().await;
        {
            let mut playlist = self.playlist.write();
            playlist.set_shuffle(prefs.shuffle);
            playlist.set_repeat(prefs.repeat);
        }
        self.session.write().volume = prefs.volume;

        if let Some(snapshot) = self.persistence.load().await {
            info!(
                track_id = %snapshot.track_id,
                position_ms = snapshot.position_ms,
                "Restored playback snapshot"
            );
            *self.pending_resume.lock() = Some(snapshot);
        }
        Ok(())
    }

    /// Resume the restored session, if one exists. Returns whether a
    /// resume was attempted. Invoke from a user gesture on gated
    /// platforms.
    pub async fn resume(&self) -> Result<bool> {
        let Some(snapshot) = self.pending_resume.lock().take() else {
            return Ok(false);
        };
        self.load_from(&snapshot.track_ref, snapshot.position_ms)
            .await?;
        Ok(true)
    }

    /// Resolve and play a track. The transport-agnostic entry point.
    #[instrument(skip(self))]
    pub async fn load_and_play(&self, track_ref: &str) -> Result<()> {
        self.load_from(track_ref, 0).await
    }

    /// Toggle between playing and paused on the active transport.
    ///
    /// A no-op with a user-visible notice while resolving or with nothing
    /// loaded.
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let status = self.session.read().status;
        if status == PlaybackStatus::Resolving {
            self.notice(NoticeEvent::NothingToPlay);
            return Ok(());
        }

        let active = self.active.lock().await;
        match (&*active, status) {
            (ActiveTransport::None, _) => {
                self.notice(NoticeEvent::NothingToPlay);
            }
            (ActiveTransport::Media(adapter), PlaybackStatus::Playing) => {
                adapter.pause().await?;
                self.enter_paused().await;
            }
            (ActiveTransport::Media(adapter), _) => {
                adapter.resume().await?;
                self.enter_resumed();
            }
            (ActiveTransport::Widget(adapter), PlaybackStatus::Playing) => {
                adapter.pause().await?;
                self.enter_paused().await;
            }
            (ActiveTransport::Widget(adapter), _) => {
                if adapter.handshake_pending() {
                    self.notice(NoticeEvent::HandshakeRequired);
                } else {
                    adapter.play().await?;
                    self.enter_resumed();
                }
            }
        }
        Ok(())
    }

    /// Advance to the next track in the derived order. Wraps only when
    /// repeat is [`RepeatMode::All`]; otherwise a boundary is a quiet
    /// no-op.
    pub async fn next(&self) -> Result<()> {
        match self.neighbor(1) {
            Some(target) => self.load_from(&target.track_ref, 0).await,
            None => {
                debug!("No next track at playlist boundary");
                Ok(())
            }
        }
    }

    /// Step back to the previous track in the derived order.
    pub async fn prev(&self) -> Result<()> {
        match self.neighbor(-1) {
            Some(target) => self.load_from(&target.track_ref, 0).await,
            None => {
                debug!("No previous track at playlist boundary");
                Ok(())
            }
        }
    }

    /// Toggle shuffle and persist the preference.
    pub async fn toggle_shuffle(&self) -> Result<bool> {
        let enabled = self.playlist.write().toggle_shuffle();
        self.persist_prefs().await;
        Ok(enabled)
    }

    /// Set the repeat mode and persist the preference.
    pub async fn set_repeat(&self, repeat: RepeatMode) -> Result<()> {
        self.playlist.write().set_repeat(repeat);
        self.persist_prefs().await;
        Ok(())
    }

    /// Seek within the current track. Silently ignored while the duration
    /// is unknown.
    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        let duration_ms = self.session.read().duration_ms;
        if duration_ms == 0 {
            debug!("Seek ignored: duration unknown");
            return Ok(());
        }
        let position_ms = position_ms.min(duration_ms);

        let active = self.active.lock().await;
        match &*active {
            ActiveTransport::None => return Ok(()),
            ActiveTransport::Media(adapter) => adapter.seek(position_ms).await?,
            ActiveTransport::Widget(adapter) => adapter.seek(position_ms).await?,
        }
        drop(active);

        let snapshot = {
            let mut session = self.session.write();
            session.set_position(position_ms);
            session.clone()
        };
        self.persistence.save_now(&snapshot).await.ok();
        Ok(())
    }

    /// Apply raw volume input from a UI surface. Clamped to `0..=100`;
    /// non-numeric input is treated as 0.
    pub async fn set_volume_input(&self, raw: &str) -> Result<()> {
        self.set_volume(Volume::from_input(raw)).await
    }

    /// Apply a volume to the session and the active transport, and
    /// persist it as a preference.
    pub async fn set_volume(&self, volume: Volume) -> Result<()> {
        self.session.write().volume = volume;

        let active = self.active.lock().await;
        match &*active {
            ActiveTransport::None => {}
            ActiveTransport::Media(adapter) => adapter.set_volume(volume).await?,
            ActiveTransport::Widget(adapter) => adapter.set_volume(volume).await?,
        }
        drop(active);

        self.persist_prefs().await;
        Ok(())
    }

    /// Stop playback and return to idle. Clears the persisted snapshot.
    pub async fn stop(&self) -> Result<()> {
        let track_id = self.session.read().track_id.clone();
        self.detach_active().await;

        let snapshot = {
            let mut session = self.session.write();
            let volume = session.volume;
            *session = PlaybackSession::idle();
            session.volume = volume;
            session.clone()
        };
        self.persistence.save_now(&snapshot).await.ok();

        if !track_id.is_empty() {
            self.bus
                .emit(CoreEvent::Playback(PlaybackEvent::Stopped { track_id }))
                .ok();
        }
        Ok(())
    }

    /// Unlock gesture-gated audio. Call from within a user gesture
    /// handler; idempotent.
    pub async fn prime_media_gesture(&self) -> Result<()> {
        if self.caps.can_autoplay_unprompted {
            return Ok(());
        }
        let active = self.active.lock().await;
        if let ActiveTransport::Media(adapter) = &*active {
            return adapter.prime().await;
        }
        drop(active);

        // No media adapter yet: run the silent cycle on the bare element
        // so a later start inherits the unlock.
        self.media_host.play().await.ok();
        self.media_host.pause().await.ok();
        debug!("Primed media element outside an active transport");
        Ok(())
    }

    /// Complete the widget autoplay handshake from a user gesture.
    pub async fn complete_handshake(&self) -> Result<()> {
        let active = self.active.lock().await;
        if let ActiveTransport::Widget(adapter) = &*active {
            if adapter.handshake_pending() {
                adapter.complete_handshake().await?;
                drop(active);
                self.notice(NoticeEvent::HandshakeDismissed);
                self.enter_resumed();
                self.emit_started(Transport::Widget);
            }
        }
        Ok(())
    }

    /// Dismiss the handshake prompt without starting playback.
    pub async fn cancel_handshake(&self) {
        let active = self.active.lock().await;
        if let ActiveTransport::Widget(adapter) = &*active {
            if adapter.handshake_pending() {
                adapter.cancel_handshake();
                drop(active);
                self.notice(NoticeEvent::HandshakeDismissed);
            }
        }
    }

    /// Spawn the command loop, the event reactor, and the lifecycle
    /// watcher. Returns the command sender other page regions use.
    pub fn start(self: &Arc<Self>) -> PlayerCommandSender {
        let (tx, rx) = mpsc::channel(32);

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(Self::command_loop(self.clone(), rx)));
        tasks.push(tokio::spawn(Self::reactor_loop(self.clone())));
        if self.config.lifecycle.is_some() {
            tasks.push(tokio::spawn(Self::lifecycle_loop(self.clone())));
        }

        PlayerCommandSender { tx }
    }

    /// Stop background tasks, tear down the active transport, and persist
    /// a final snapshot. Used on page teardown.
    pub async fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.detach_active().await;
        let snapshot = self.session.read().clone();
        self.persistence.save_now(&snapshot).await.ok();
        info!("Player orchestrator shut down");
    }

    // ========================================================================
    // Load pipeline
    // ========================================================================

    async fn load_from(&self, track_ref: &str, resume_ms: u64) -> Result<()> {
        if !self.gate.is_authenticated().await {
            debug!("Viewer unauthenticated, surfacing login gate");
            self.notice(NoticeEvent::LoginRequired);
            return Ok(());
        }

        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.detach_active().await;
        if !self.is_current(generation) {
            return Ok(());
        }

        let descriptor = self.playlist.read().find_by_ref(track_ref).cloned();
        let track_id = descriptor
            .as_ref()
            .map(|d| d.track_id.clone())
            .unwrap_or_else(|| track_ref.to_string());

        {
            let mut session = self.session.write();
            let volume = session.volume;
            *session = PlaybackSession {
                track_id: track_id.clone(),
                track_ref: track_ref.to_string(),
                transport: Transport::None,
                status: PlaybackStatus::Resolving,
                position_ms: resume_ms,
                duration_ms: 0,
                volume,
            };
        }

        let resolved = self.resolver.resolve(track_ref).await;
        if !self.is_current(generation) {
            debug!("Discarding stale resolution for superseded load");
            return Ok(());
        }

        let stream = match resolved {
            Ok(Resolution::Playable(stream)) => stream,
            Ok(Resolution::Deleted) => {
                info!(track_id = %track_id, "Track resolved as deleted");
                self.persistence.clear().await.ok();
                self.go_idle();
                self.notice(NoticeEvent::TrackUnavailable { track_id });
                return Ok(());
            }
            Err(e) => {
                warn!("Resolution failed: {}", e);
                self.go_idle();
                self.notice(NoticeEvent::PlaybackFailed {
                    message: "Could not reach the streaming service. Try again.".to_string(),
                });
                return Ok(());
            }
        };

        let use_media =
            self.headers.has_credential().await && !self.caps.requires_widget_handshake;
        self.attach_transport(generation, &track_id, track_ref, stream, resume_ms, use_media)
            .await
    }

    async fn attach_transport(
        &self,
        generation: u64,
        track_id: &str,
        track_ref: &str,
        stream: PlayableStream,
        resume_ms: u64,
        use_media: bool,
    ) -> Result<()> {
        let volume = self.session.read().volume;
        let mut active = self.active.lock().await;
        if !self.is_current(generation) {
            return Ok(());
        }

        if use_media {
            let adapter = MediaAdapter::new(
                self.media_host.clone(),
                self.caps,
                self.bus.clone(),
                self.cell.clone(),
                track_id,
                self.tuning.ready_timeout,
            );

            match adapter
                .start(StartSpec {
                    stream: stream.clone(),
                    resume_ms,
                    volume,
                })
                .await
            {
                Ok(()) => {
                    if !self.is_current(generation) {
                        adapter.teardown().await;
                        return Ok(());
                    }
                    *active = ActiveTransport::Media(adapter);
                    drop(active);
                    self.enter_playing(Transport::Media, false).await;
                    return Ok(());
                }
                Err(e) => {
                    warn!("Media transport failed to start, falling back: {}", e);
                    adapter.teardown().await;
                    self.bus
                        .emit(CoreEvent::Playback(PlaybackEvent::Fallback {
                            track_id: track_id.to_string(),
                            resume_ms,
                        }))
                        .ok();
                    // One-shot: control flow falls through to the widget
                    // exactly once, never back to media.
                }
            }
        }

        let adapter = WidgetAdapter::new(
            self.widget_host.clone(),
            self.caps,
            self.bus.clone(),
            self.cell.clone(),
            track_id,
        );

        match adapter
            .mount(
                track_ref,
                MountOptions {
                    resume_ms,
                    autoplay: true,
                    visible: self.tuning.widget_visible,
                },
            )
            .await
        {
            Ok(()) => {
                if !self.is_current(generation) {
                    adapter.unmount().await;
                    return Ok(());
                }
                let handshake = adapter.handshake_pending();
                *active = ActiveTransport::Widget(adapter);
                drop(active);
                if handshake {
                    self.notice(NoticeEvent::HandshakeRequired);
                }
                self.enter_playing(Transport::Widget, handshake).await;
                Ok(())
            }
            Err(e) => {
                warn!("Widget transport failed to mount: {}", e);
                drop(active);
                self.go_idle();
                self.notice(NoticeEvent::PlaybackFailed {
                    message: "Playback is unavailable right now.".to_string(),
                });
                Ok(())
            }
        }
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    async fn enter_playing(&self, transport: Transport, handshake_pending: bool) {
        let snapshot = {
            let mut session = self.session.write();
            session.transport = transport;
            session.duration_ms = self.cell.duration_ms();
            session.status = if handshake_pending {
                PlaybackStatus::Paused
            } else {
                PlaybackStatus::Playing
            };
            session.clone()
        };

        if !handshake_pending {
            self.ticker.start(self.ticker_shared());
            self.emit_started(transport);
        }
        self.persistence.save_now(&snapshot).await.ok();
    }

    async fn enter_paused(&self) {
        self.ticker.stop();
        let snapshot = {
            let mut session = self.session.write();
            session.set_position(self.cell.position_ms());
            session.status = PlaybackStatus::Paused;
            session.clone()
        };
        self.persistence.save_now(&snapshot).await.ok();
    }

    fn enter_resumed(&self) {
        self.session.write().status = PlaybackStatus::Playing;
        self.ticker.start(self.ticker_shared());
    }

    fn go_idle(&self) {
        let mut session = self.session.write();
        let volume = session.volume;
        *session = PlaybackSession::idle();
        session.volume = volume;
    }

    async fn detach_active(&self) {
        self.ticker.stop();
        let mut active = self.active.lock().await;
        match std::mem::replace(&mut *active, ActiveTransport::None) {
            ActiveTransport::None => {}
            ActiveTransport::Media(adapter) => adapter.teardown().await,
            ActiveTransport::Widget(adapter) => adapter.unmount().await,
        }
        self.session.write().transport = Transport::None;
    }

    fn emit_started(&self, transport: Transport) {
        let (track_id, title, artist) = {
            let session = self.session.read();
            let playlist = self.playlist.read();
            let descriptor = playlist.find(&session.track_id);
            (
                session.track_id.clone(),
                descriptor.and_then(|d| d.title.clone()),
                descriptor.and_then(|d| d.artist.clone()),
            )
        };
        self.bus
            .emit(CoreEvent::Playback(PlaybackEvent::Started {
                track_id,
                title,
                artist,
                transport,
            }))
            .ok();
    }

    // ========================================================================
    // Background loops
    // ========================================================================

    async fn command_loop(this: Arc<Self>, mut rx: mpsc::Receiver<PlayerCommand>) {
        while let Some(command) = rx.recv().await {
            let result = match command {
                PlayerCommand::Play { track_ref } => this.load_and_play(&track_ref).await,
                PlayerCommand::TogglePlayPause => this.toggle_play_pause().await,
                PlayerCommand::Next => this.next().await,
                PlayerCommand::Prev => this.prev().await,
                PlayerCommand::SeekMs(ms) => this.seek(ms).await,
                PlayerCommand::SetVolumeInput(raw) => this.set_volume_input(&raw).await,
                PlayerCommand::ToggleShuffle => this.toggle_shuffle().await.map(|_| ()),
                PlayerCommand::SetRepeat(mode) => this.set_repeat(mode).await,
                PlayerCommand::Stop => this.stop().await,
                PlayerCommand::CompleteHandshake => this.complete_handshake().await,
                PlayerCommand::CancelHandshake => {
                    this.cancel_handshake().await;
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!("Player command failed: {}", e);
                this.notice(NoticeEvent::PlaybackFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    async fn reactor_loop(this: Arc<Self>) {
        let mut rx = this.bus.subscribe();
        loop {
            match rx.recv().await {
                Ok(CoreEvent::Playback(PlaybackEvent::Ended { track_id })) => {
                    this.handle_ended(&track_id).await;
                }
                Ok(CoreEvent::Playback(PlaybackEvent::Error {
                    track_id, message, ..
                })) => {
                    this.handle_transport_error(track_id.as_deref(), &message)
                        .await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    debug!("Reactor lagged behind {missed} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn lifecycle_loop(this: Arc<Self>) {
        let Some(observer) = this.config.lifecycle.clone() else {
            return;
        };
        let mut stream = match observer.subscribe_changes().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Lifecycle subscription failed: {}", e);
                return;
            }
        };

        while let Some(state) = stream.next().await {
            match state {
                PageVisibility::Hidden => {
                    debug!("Page hidden, stopping progress ticker");
                    this.ticker.stop();
                }
                PageVisibility::Visible => {
                    if this.session.read().status == PlaybackStatus::Playing {
                        debug!("Page visible, restarting progress ticker");
                        this.ticker.start(this.ticker_shared());
                    }
                }
                PageVisibility::Unloading => {
                    let snapshot = this.session.read().clone();
                    this.persistence.save_now(&snapshot).await.ok();
                }
            }
        }
    }

    async fn handle_ended(&self, track_id: &str) {
        {
            let session = self.session.read();
            if session.track_id != track_id {
                return; // stale event from a previous track
            }
        }

        self.ticker.stop();
        let snapshot = {
            let mut session = self.session.write();
            if session.duration_ms > 0 {
                session.position_ms = session.duration_ms;
            }
            session.status = PlaybackStatus::Paused;
            session.clone()
        };
        self.persistence.save_now(&snapshot).await.ok();

        // Auto-advance; next_after wraps only under repeat-all.
        let target = self.playlist.read().next_after(track_id).cloned();
        if let Some(target) = target {
            if let Err(e) = self.load_from(&target.track_ref, 0).await {
                warn!("Auto-advance failed: {}", e);
            }
        }
    }

    async fn handle_transport_error(&self, track_id: Option<&str>, message: &str) {
        {
            let session = self.session.read();
            let matches = track_id.map(|id| id == session.track_id).unwrap_or(true);
            if !matches
                || !matches!(
                    session.status,
                    PlaybackStatus::Playing | PlaybackStatus::Paused
                )
            {
                return;
            }
        }

        self.ticker.stop();
        let snapshot = {
            let mut session = self.session.write();
            session.status = PlaybackStatus::Error;
            session.clone()
        };
        self.persistence.save_now(&snapshot).await.ok();
        self.notice(NoticeEvent::PlaybackFailed {
            message: message.to_string(),
        });
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn is_current(&self, generation: u64) -> bool {
        self.load_generation.load(Ordering::SeqCst) == generation
    }

    fn neighbor(&self, step: i64) -> Option<TrackDescriptor> {
        let session = self.session.read();
        let playlist = self.playlist.read();
        if !session.has_track() {
            return playlist.first().cloned();
        }
        if step >= 0 {
            playlist.next_after(&session.track_id).cloned()
        } else {
            playlist.prev_before(&session.track_id).cloned()
        }
    }

    fn ticker_shared(&self) -> TickerShared {
        TickerShared {
            cell: self.cell.clone(),
            session: self.session.clone(),
            bus: self.bus.clone(),
            persistence: self.persistence.clone(),
        }
    }

    fn notice(&self, notice: NoticeEvent) {
        self.bus.emit(CoreEvent::Notice(notice)).ok();
    }

    async fn persist_prefs(&self) {
        let prefs = {
            let session = self.session.read();
            let playlist = self.playlist.read();
            PlayerPrefs {
                shuffle: playlist.shuffle_enabled(),
                repeat: playlist.repeat(),
                volume: session.volume,
            }
        };
        if let Err(e) = self.persistence.save_prefs(&prefs).await {
            warn!("Persisting preferences failed: {}", e);
        }
    }
}

impl Drop for PlayerOrchestrator {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
