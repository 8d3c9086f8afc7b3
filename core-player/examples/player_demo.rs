//! # Playback Engine Usage Example
//!
//! Demonstrates wiring the orchestrator against simulated page hosts:
//! a fake media element, a fake embeddable widget, and a scripted
//! resolution endpoint. The engine walks through resolve → media start →
//! widget fallback while the event log prints what a UI layer would
//! render.
//!
//! Run with: `cargo run --example player_demo --package core-player`

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{AuthHeaderProvider, HttpClient, HttpRequest, HttpResponse};
use bridge_traits::media::{MediaElementEvent, MediaElementHost, MediaEventStream, MediaSource};
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::resolver::{PlayableStream, Resolution, TrackResolver};
use bridge_traits::storage::SettingsStore;
use bridge_traits::widget::{
    WidgetCommand, WidgetEvent, WidgetEventKind, WidgetEventStream, WidgetHost, WidgetLoadOptions,
};
use core_auth::OpenGate;
use core_player::{PlayerOrchestrator, TrackDescriptor};
use core_runtime::config::CoreConfig;
use core_runtime::events::CoreEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Simulated page hosts
// ============================================================================

/// Media element that refuses playback, to show the widget fallback.
struct FlakyMediaElement {
    refuse_play: AtomicBool,
    senders: Mutex<Vec<mpsc::UnboundedSender<MediaElementEvent>>>,
}

impl FlakyMediaElement {
    fn new(refuse_play: bool) -> Arc<Self> {
        Arc::new(Self {
            refuse_play: AtomicBool::new(refuse_play),
            senders: Mutex::new(Vec::new()),
        })
    }

    fn emit(&self, event: MediaElementEvent) {
        self.senders
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

struct DemoMediaStream(mpsc::UnboundedReceiver<MediaElementEvent>);

#[async_trait]
impl MediaEventStream for DemoMediaStream {
    async fn next(&mut self) -> Option<MediaElementEvent> {
        self.0.recv().await
    }
}

#[async_trait]
impl MediaElementHost for FlakyMediaElement {
    async fn load(&self, source: MediaSource) -> BridgeResult<()> {
        println!("  [media element] loading {}", source.url());
        self.emit(MediaElementEvent::Ready {
            duration_ms: 214_000,
        });
        Ok(())
    }

    async fn detach(&self) -> BridgeResult<()> {
        println!("  [media element] detached");
        self.senders.lock().clear();
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        if self.refuse_play.load(Ordering::SeqCst) {
            println!("  [media element] play() rejected by autoplay policy");
            return Err(BridgeError::OperationFailed("autoplay rejected".into()));
        }
        self.emit(MediaElementEvent::Play);
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.emit(MediaElementEvent::Pause);
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> BridgeResult<()> {
        println!("  [media element] seek to {position_ms}ms");
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> BridgeResult<()> {
        println!("  [media element] volume {percent}%");
        Ok(())
    }

    async fn position_ms(&self) -> BridgeResult<u64> {
        Ok(0)
    }

    async fn duration_ms(&self) -> BridgeResult<u64> {
        Ok(214_000)
    }

    async fn subscribe_events(&self) -> BridgeResult<Box<dyn MediaEventStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        Ok(Box::new(DemoMediaStream(rx)))
    }
}

/// Widget that becomes ready shortly after load and echoes commands.
struct DemoWidget {
    senders: Mutex<Vec<mpsc::UnboundedSender<WidgetEvent>>>,
}

impl DemoWidget {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            senders: Mutex::new(Vec::new()),
        })
    }

    fn emit(&self, event: WidgetEvent) {
        self.senders
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

struct DemoWidgetStream(mpsc::UnboundedReceiver<WidgetEvent>);

#[async_trait]
impl WidgetEventStream for DemoWidgetStream {
    async fn next(&mut self) -> Option<WidgetEvent> {
        self.0.recv().await
    }
}

#[async_trait]
impl WidgetHost for DemoWidget {
    async fn load(&self, track_ref: &str, options: WidgetLoadOptions) -> BridgeResult<()> {
        println!(
            "  [widget] loading {track_ref} (auto_play: {})",
            options.auto_play
        );
        self.emit(WidgetEvent::Ready);
        Ok(())
    }

    async fn bind(&self, kind: WidgetEventKind) -> BridgeResult<()> {
        println!("  [widget] bind {kind:?}");
        Ok(())
    }

    async fn unbind(&self, _kind: WidgetEventKind) -> BridgeResult<()> {
        Ok(())
    }

    async fn command(&self, command: WidgetCommand) -> BridgeResult<()> {
        println!("  [widget] command {command:?}");
        match command {
            WidgetCommand::Play => self.emit(WidgetEvent::Play),
            WidgetCommand::Pause => self.emit(WidgetEvent::Pause),
            _ => {}
        }
        Ok(())
    }

    async fn set_visible(&self, visible: bool) -> BridgeResult<()> {
        println!("  [widget] visible: {visible}");
        Ok(())
    }

    async fn subscribe_events(&self) -> BridgeResult<Box<dyn WidgetEventStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        Ok(Box::new(DemoWidgetStream(rx)))
    }
}

/// Resolver scripted entirely in memory.
struct DemoResolver;

#[async_trait]
impl TrackResolver for DemoResolver {
    async fn resolve(&self, track_ref: &str) -> BridgeResult<Resolution> {
        println!("  [resolver] resolving {track_ref}");
        if track_ref.contains("deleted") {
            return Ok(Resolution::Deleted);
        }
        Ok(Resolution::Playable(PlayableStream {
            playable_url: format!("https://cdn.example.com/{track_ref}.m3u8"),
            is_segmented: true,
        }))
    }
}

struct MemorySettings(Mutex<HashMap<String, String>>);

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.0.lock().insert(key.into(), value.into());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.0.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.0.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.0.lock().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.0.lock().clear();
        Ok(())
    }
}

struct OfflineHttp;

#[async_trait]
impl HttpClient for OfflineHttp {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        Err(BridgeError::NotAvailable("demo runs offline".into()))
    }
}

struct DemoHeaders;

#[async_trait]
impl AuthHeaderProvider for DemoHeaders {
    async fn auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Authorization".into(), "OAuth demo-token".into());
        headers
    }

    async fn has_credential(&self) -> bool {
        true
    }
}

// ============================================================================
// Demo
// ============================================================================

#[tokio::main]
async fn main() {
    core_runtime::logging::init_logging(core_runtime::logging::LoggingConfig::default()).ok();

    let media = FlakyMediaElement::new(true);
    let widget = DemoWidget::new();

    let config = CoreConfig::builder()
        .media_host(media.clone())
        .widget_host(widget)
        .settings_store(Arc::new(MemorySettings(Mutex::new(HashMap::new()))))
        .http_client(Arc::new(OfflineHttp))
        .capabilities(PlatformCapabilities::desktop())
        .build()
        .expect("demo config");

    let orchestrator = PlayerOrchestrator::new(
        config,
        Arc::new(DemoResolver),
        Arc::new(OpenGate),
        Arc::new(DemoHeaders),
    );

    orchestrator.sync_playlist(vec![
        TrackDescriptor::new("demo-1", "artist/first-track").with_title("First Track"),
        TrackDescriptor::new("demo-2", "artist/second-track").with_title("Second Track"),
    ]);
    orchestrator.initialize().await.expect("initialize");

    // Print the event stream the way a UI layer would consume it.
    let mut events = orchestrator.events().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let CoreEvent::Playback(playback) = &event {
                println!("  [event] {playback:?}");
            } else {
                println!("  [notice] {:?}", event.description());
            }
        }
    });

    println!("\n=== Play a track (media refuses, widget takes over) ===");
    orchestrator
        .load_and_play("artist/first-track")
        .await
        .expect("load");
    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("\n=== Pause / resume ===");
    orchestrator.toggle_play_pause().await.expect("pause");
    orchestrator.toggle_play_pause().await.expect("resume");
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n=== A deleted track surfaces a notice, nothing attaches ===");
    orchestrator
        .load_and_play("artist/deleted-track")
        .await
        .expect("load");
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n=== Shut down ===");
    orchestrator.shutdown().await;

    let session = orchestrator.session();
    println!(
        "final session: status={:?} transport={}",
        session.status, session.transport
    );
}
