//! Scripted fake hosts for engine integration tests.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::AuthHeaderProvider;
use bridge_traits::media::{MediaElementEvent, MediaElementHost, MediaEventStream, MediaSource};
use bridge_traits::resolver::{PlayableStream, Resolution, TrackResolver};
use bridge_traits::storage::SettingsStore;
use bridge_traits::widget::{
    WidgetCommand, WidgetEvent, WidgetEventKind, WidgetEventStream, WidgetHost, WidgetLoadOptions,
};
use core_auth::LoginGate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Media element host
// ============================================================================

pub struct FakeMediaHost {
    pub loads: Mutex<Vec<MediaSource>>,
    pub plays: AtomicUsize,
    pub pauses: AtomicUsize,
    pub seeks: Mutex<Vec<u64>>,
    pub volumes: Mutex<Vec<u8>>,
    pub detaches: AtomicUsize,
    /// When set, `play()` rejects like a refused autoplay attempt.
    pub fail_play: AtomicBool,
    /// Duration reported by the ready event emitted on load.
    pub ready_duration_ms: AtomicU64,
    /// When cleared, load emits no ready event (start will time out).
    pub emit_ready: AtomicBool,
    senders: Mutex<Vec<mpsc::UnboundedSender<MediaElementEvent>>>,
}

impl FakeMediaHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            loads: Mutex::new(Vec::new()),
            plays: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            seeks: Mutex::new(Vec::new()),
            volumes: Mutex::new(Vec::new()),
            detaches: AtomicUsize::new(0),
            fail_play: AtomicBool::new(false),
            ready_duration_ms: AtomicU64::new(180_000),
            emit_ready: AtomicBool::new(true),
            senders: Mutex::new(Vec::new()),
        })
    }

    pub fn emit(&self, event: MediaElementEvent) {
        self.senders
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

struct ChannelMediaStream(mpsc::UnboundedReceiver<MediaElementEvent>);

#[async_trait]
impl MediaEventStream for ChannelMediaStream {
    async fn next(&mut self) -> Option<MediaElementEvent> {
        self.0.recv().await
    }
}

#[async_trait]
impl MediaElementHost for FakeMediaHost {
    async fn load(&self, source: MediaSource) -> BridgeResult<()> {
        self.loads.lock().push(source);
        if self.emit_ready.load(Ordering::SeqCst) {
            self.emit(MediaElementEvent::Ready {
                duration_ms: self.ready_duration_ms.load(Ordering::SeqCst),
            });
        }
        Ok(())
    }

    async fn detach(&self) -> BridgeResult<()> {
        self.detaches.fetch_add(1, Ordering::SeqCst);
        self.senders.lock().clear();
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "play() rejected by autoplay policy".into(),
            ));
        }
        self.plays.fetch_add(1, Ordering::SeqCst);
        self.emit(MediaElementEvent::Play);
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.emit(MediaElementEvent::Pause);
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> BridgeResult<()> {
        self.seeks.lock().push(position_ms);
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> BridgeResult<()> {
        self.volumes.lock().push(percent);
        Ok(())
    }

    async fn position_ms(&self) -> BridgeResult<u64> {
        Ok(0)
    }

    async fn duration_ms(&self) -> BridgeResult<u64> {
        Ok(self.ready_duration_ms.load(Ordering::SeqCst))
    }

    async fn subscribe_events(&self) -> BridgeResult<Box<dyn MediaEventStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        Ok(Box::new(ChannelMediaStream(rx)))
    }
}

// ============================================================================
// Widget host
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOp {
    Load { track_ref: String, auto_play: bool },
    Bind(WidgetEventKind),
    Unbind(WidgetEventKind),
    Command(WidgetCommand),
    Visible(bool),
}

pub struct FakeWidgetHost {
    pub ops: Mutex<Vec<WidgetOp>>,
    /// When set, the library-ready event fires right after load.
    pub auto_ready: AtomicBool,
    senders: Mutex<Vec<mpsc::UnboundedSender<WidgetEvent>>>,
}

impl FakeWidgetHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ops: Mutex::new(Vec::new()),
            auto_ready: AtomicBool::new(true),
            senders: Mutex::new(Vec::new()),
        })
    }

    pub fn emit(&self, event: WidgetEvent) {
        self.senders
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn loads(&self) -> Vec<WidgetOp> {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, WidgetOp::Load { .. }))
            .cloned()
            .collect()
    }

    pub fn commands(&self) -> Vec<WidgetCommand> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                WidgetOp::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Net bind count per event kind: binds minus unbinds.
    pub fn net_bindings(&self) -> HashMap<WidgetEventKind, i64> {
        let mut net = HashMap::new();
        for op in self.ops.lock().iter() {
            match op {
                WidgetOp::Bind(kind) => *net.entry(*kind).or_insert(0) += 1,
                WidgetOp::Unbind(kind) => *net.entry(*kind).or_insert(0) -= 1,
                _ => {}
            }
        }
        net
    }
}

struct ChannelWidgetStream(mpsc::UnboundedReceiver<WidgetEvent>);

#[async_trait]
impl WidgetEventStream for ChannelWidgetStream {
    async fn next(&mut self) -> Option<WidgetEvent> {
        self.0.recv().await
    }
}

#[async_trait]
impl WidgetHost for FakeWidgetHost {
    async fn load(&self, track_ref: &str, options: WidgetLoadOptions) -> BridgeResult<()> {
        self.ops.lock().push(WidgetOp::Load {
            track_ref: track_ref.to_string(),
            auto_play: options.auto_play,
        });
        if self.auto_ready.load(Ordering::SeqCst) {
            self.emit(WidgetEvent::Ready);
        }
        Ok(())
    }

    async fn bind(&self, kind: WidgetEventKind) -> BridgeResult<()> {
        self.ops.lock().push(WidgetOp::Bind(kind));
        Ok(())
    }

    async fn unbind(&self, kind: WidgetEventKind) -> BridgeResult<()> {
        self.ops.lock().push(WidgetOp::Unbind(kind));
        Ok(())
    }

    async fn command(&self, command: WidgetCommand) -> BridgeResult<()> {
        self.ops.lock().push(WidgetOp::Command(command));
        match command {
            WidgetCommand::Play => self.emit(WidgetEvent::Play),
            WidgetCommand::Pause => self.emit(WidgetEvent::Pause),
            _ => {}
        }
        Ok(())
    }

    async fn set_visible(&self, visible: bool) -> BridgeResult<()> {
        self.ops.lock().push(WidgetOp::Visible(visible));
        Ok(())
    }

    async fn subscribe_events(&self) -> BridgeResult<Box<dyn WidgetEventStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        Ok(Box::new(ChannelWidgetStream(rx)))
    }
}

// ============================================================================
// Resolver
// ============================================================================

#[derive(Clone)]
pub enum ScriptedOutcome {
    Playable { url: String, segmented: bool },
    Deleted,
    Transient,
}

#[derive(Clone, Default)]
struct Script {
    outcome: Option<ScriptedOutcome>,
    delay: Option<Duration>,
}

pub struct FakeResolver {
    scripts: Mutex<HashMap<String, Script>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn script(&self, track_ref: &str, outcome: ScriptedOutcome) {
        self.scripts
            .lock()
            .entry(track_ref.to_string())
            .or_default()
            .outcome = Some(outcome);
    }

    pub fn script_progressive(&self, track_ref: &str) {
        self.script(
            track_ref,
            ScriptedOutcome::Playable {
                url: format!("https://cdn.example.com/{}.mp3", track_ref),
                segmented: false,
            },
        );
    }

    pub fn script_segmented(&self, track_ref: &str) {
        self.script(
            track_ref,
            ScriptedOutcome::Playable {
                url: format!("https://cdn.example.com/{}.m3u8", track_ref),
                segmented: true,
            },
        );
    }

    pub fn delay(&self, track_ref: &str, delay: Duration) {
        self.scripts
            .lock()
            .entry(track_ref.to_string())
            .or_default()
            .delay = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, track_ref: &str) -> BridgeResult<Resolution> {
        self.calls.lock().push(track_ref.to_string());
        let script = self.scripts.lock().get(track_ref).cloned();
        let script = script.unwrap_or_default();

        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }

        match script.outcome {
            Some(ScriptedOutcome::Playable { url, segmented }) => {
                Ok(Resolution::Playable(PlayableStream {
                    playable_url: url,
                    is_segmented: segmented,
                }))
            }
            Some(ScriptedOutcome::Deleted) => Ok(Resolution::Deleted),
            Some(ScriptedOutcome::Transient) | None => {
                Err(BridgeError::Endpoint {
                    status: 503,
                    message: "scripted transient failure".into(),
                })
            }
        }
    }
}

// ============================================================================
// Gate / headers / settings
// ============================================================================

pub struct FakeGate(pub AtomicBool);

impl FakeGate {
    pub fn authenticated() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(true)))
    }

    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(false)))
    }
}

#[async_trait]
impl LoginGate for FakeGate {
    async fn is_authenticated(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct FakeHeaders(pub AtomicBool);

impl FakeHeaders {
    pub fn with_credential() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(true)))
    }

    pub fn without_credential() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(false)))
    }
}

#[async_trait]
impl AuthHeaderProvider for FakeHeaders {
    async fn auth_headers(&self) -> HashMap<String, String> {
        if self.0.load(Ordering::SeqCst) {
            let mut headers = HashMap::new();
            headers.insert("Authorization".into(), "OAuth test-token".into());
            headers
        } else {
            HashMap::new()
        }
    }

    async fn has_credential(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MemorySettings {
    pub values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values.lock().insert(key.into(), value.into());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.values.lock().clear();
        Ok(())
    }
}

/// HTTP client for wiring tests that never reach the network.
pub struct NoopHttpClient;

#[async_trait]
impl bridge_traits::http::HttpClient for NoopHttpClient {
    async fn execute(
        &self,
        _request: bridge_traits::http::HttpRequest,
    ) -> BridgeResult<bridge_traits::http::HttpResponse> {
        Err(BridgeError::NotAvailable("no network in tests".into()))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Poll until the predicate holds or a second passes.
pub async fn eventually<F: Fn() -> bool>(predicate: F) -> bool {
    for _ in 0..100 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}
