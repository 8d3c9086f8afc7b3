//! End-to-end tests for the playback orchestrator state machine: transport
//! selection, one-shot fallback, supersession, deleted-track handling, and
//! persistence behavior, all against scripted fake hosts.

mod support;

use bridge_traits::media::MediaElementEvent;
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::widget::WidgetCommand;
use core_auth::LoginGate;
use core_player::orchestrator::PlayerOrchestrator;
use core_player::playlist::{RepeatMode, TrackDescriptor};
use core_player::session::PlaybackStatus;
use core_runtime::config::{CoreConfig, PlayerTuning};
use core_runtime::events::{CoreEvent, NoticeEvent, PlaybackEvent, Transport};
use std::sync::Arc;
use std::time::Duration;
use support::*;

struct Harness {
    media: Arc<FakeMediaHost>,
    widget: Arc<FakeWidgetHost>,
    settings: Arc<MemorySettings>,
    resolver: Arc<FakeResolver>,
    orchestrator: Arc<PlayerOrchestrator>,
}

fn tuning() -> PlayerTuning {
    PlayerTuning {
        ready_timeout: Duration::from_millis(200),
        persist_interval: Duration::from_millis(50),
        ticker_period: Duration::from_millis(50),
        ..PlayerTuning::default()
    }
}

fn harness_with(
    caps: PlatformCapabilities,
    gate: Arc<dyn LoginGate>,
    has_credential: bool,
    settings: Arc<MemorySettings>,
) -> Harness {
    let media = FakeMediaHost::new();
    let widget = FakeWidgetHost::new();
    let resolver = FakeResolver::new();

    let config = CoreConfig::builder()
        .media_host(media.clone())
        .widget_host(widget.clone())
        .settings_store(settings.clone())
        .http_client(Arc::new(NoopHttpClient))
        .capabilities(caps)
        .tuning(tuning())
        .build()
        .expect("test config");

    let headers = if has_credential {
        FakeHeaders::with_credential()
    } else {
        FakeHeaders::without_credential()
    };

    let orchestrator = PlayerOrchestrator::new(config, resolver.clone(), gate, headers);
    Harness {
        media,
        widget,
        settings,
        resolver,
        orchestrator,
    }
}

fn harness() -> Harness {
    harness_with(
        PlatformCapabilities::desktop(),
        FakeGate::authenticated(),
        true,
        MemorySettings::new(),
    )
}

fn two_track_playlist(h: &Harness) {
    h.orchestrator.sync_playlist(vec![
        TrackDescriptor::new("id-0", "ref-0").with_title("First"),
        TrackDescriptor::new("id-1", "ref-1").with_title("Second"),
    ]);
}

// ============================================================================
// Resolution outcomes
// ============================================================================

#[tokio::test]
async fn deleted_track_never_attaches_a_transport() {
    let h = harness();
    h.resolver.script("ref-gone", ScriptedOutcome::Deleted);

    let mut events = h.orchestrator.events().subscribe();
    h.orchestrator.load_and_play("ref-gone").await.unwrap();

    let session = h.orchestrator.session();
    assert_eq!(session.status, PlaybackStatus::Idle);
    assert_eq!(session.transport, Transport::None);
    assert!(h.media.loads.lock().is_empty());
    assert!(h.widget.loads().is_empty());

    let mut unavailable = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(
            event,
            CoreEvent::Notice(NoticeEvent::TrackUnavailable { .. })
        ) {
            unavailable += 1;
        }
    }
    assert_eq!(unavailable, 1);
}

#[tokio::test]
async fn transient_resolution_failure_surfaces_retryable_notice() {
    let h = harness();
    h.resolver.script("ref-bad", ScriptedOutcome::Transient);

    let mut events = h.orchestrator.events().subscribe();
    h.orchestrator.load_and_play("ref-bad").await.unwrap();

    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Idle);
    assert!(h.media.loads.lock().is_empty());

    let mut failed = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, CoreEvent::Notice(NoticeEvent::PlaybackFailed { .. })) {
            failed = true;
        }
    }
    assert!(failed);
}

#[tokio::test]
async fn unauthenticated_viewer_gets_gate_and_no_resolution() {
    let mut gate = MockGate::new();
    gate.expect_is_authenticated().times(1).returning(|| false);

    let h = harness_with(
        PlatformCapabilities::desktop(),
        Arc::new(gate),
        true,
        MemorySettings::new(),
    );
    h.resolver.script_progressive("ref-a");

    let mut events = h.orchestrator.events().subscribe();
    h.orchestrator.load_and_play("ref-a").await.unwrap();

    assert_eq!(h.resolver.call_count(), 0);
    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Idle);
    assert!(matches!(
        events.try_recv(),
        Ok(CoreEvent::Notice(NoticeEvent::LoginRequired))
    ));
}

mockall::mock! {
    Gate {}

    #[async_trait::async_trait]
    impl LoginGate for Gate {
        async fn is_authenticated(&self) -> bool;
    }
}

// ============================================================================
// Transport selection and fallback
// ============================================================================

#[tokio::test]
async fn credentialed_viewer_plays_through_media_transport() {
    let h = harness();
    two_track_playlist(&h);
    h.resolver.script_progressive("ref-0");

    h.orchestrator.load_and_play("ref-0").await.unwrap();

    let session = h.orchestrator.session();
    assert_eq!(session.status, PlaybackStatus::Playing);
    assert_eq!(session.transport, Transport::Media);
    assert_eq!(session.track_id, "id-0");
    assert_eq!(h.media.loads.lock().len(), 1);
    assert!(h.widget.loads().is_empty());
}

#[tokio::test]
async fn viewer_without_credential_goes_straight_to_widget() {
    let h = harness_with(
        PlatformCapabilities::desktop(),
        FakeGate::authenticated(),
        false,
        MemorySettings::new(),
    );
    h.resolver.script_progressive("ref-0");

    h.orchestrator.load_and_play("ref-0").await.unwrap();

    assert!(h.media.loads.lock().is_empty());
    let loads = h.widget.loads();
    assert_eq!(loads.len(), 1);
    assert_eq!(
        loads[0],
        WidgetOp::Load {
            track_ref: "ref-0".into(),
            auto_play: true
        }
    );
    assert_eq!(h.orchestrator.session().transport, Transport::Widget);
}

#[tokio::test]
async fn media_start_rejection_falls_back_to_widget_once_at_same_position() {
    let h = harness();
    h.resolver.script_segmented("ref-b");
    h.media
        .fail_play
        .store(true, std::sync::atomic::Ordering::SeqCst);

    // Persist a snapshot so the load resumes mid-track.
    let mut events = h.orchestrator.events().subscribe();
    seed_snapshot(&h.settings, "id-b", "ref-b", 42_000).await;
    h.orchestrator.initialize().await.unwrap();
    assert!(h.orchestrator.resume().await.unwrap());

    // Media was attempted and torn down fully.
    assert_eq!(h.media.loads.lock().len(), 1);
    assert!(h.media.detaches.load(std::sync::atomic::Ordering::SeqCst) >= 1);

    // The widget took over exactly once.
    let session = h.orchestrator.session();
    assert_eq!(session.transport, Transport::Widget);
    assert_eq!(session.status, PlaybackStatus::Playing);
    assert_eq!(h.widget.loads().len(), 1);

    // Widget resumed at the same position once ready.
    assert!(
        eventually(|| h
            .widget
            .commands()
            .contains(&WidgetCommand::Seek {
                position_ms: 42_000
            }))
        .await
    );

    // Exactly one fallback event, carrying the same resume position.
    let mut fallbacks = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Playback(PlaybackEvent::Fallback { resume_ms, .. }) = event {
            fallbacks.push(resume_ms);
        }
    }
    assert_eq!(fallbacks, vec![42_000]);
}

#[tokio::test]
async fn media_ready_timeout_also_triggers_fallback() {
    let h = harness();
    h.resolver.script_progressive("ref-a");
    h.media
        .emit_ready
        .store(false, std::sync::atomic::Ordering::SeqCst);

    h.orchestrator.load_and_play("ref-a").await.unwrap();

    assert_eq!(h.orchestrator.session().transport, Transport::Widget);
    assert_eq!(h.widget.loads().len(), 1);
}

#[tokio::test]
async fn no_duplicate_widget_bindings_across_track_changes() {
    let h = harness_with(
        PlatformCapabilities::desktop(),
        FakeGate::authenticated(),
        false,
        MemorySettings::new(),
    );
    h.resolver.script_progressive("ref-0");
    h.resolver.script_progressive("ref-1");

    h.orchestrator.load_and_play("ref-0").await.unwrap();
    h.orchestrator.load_and_play("ref-1").await.unwrap();

    // The widget instance was reused; nothing may double-fire. Extra
    // unbinds are no-ops, but more active bindings than one per kind
    // would double-deliver events.
    for (kind, net) in h.widget.net_bindings() {
        assert!(net <= 1, "event kind {kind:?} has net binding count {net}");
    }

    // Every bind is directly preceded by an unbind of the same kind.
    let ops = h.widget.ops.lock().clone();
    for (i, op) in ops.iter().enumerate() {
        if let WidgetOp::Bind(kind) = op {
            assert!(
                matches!(ops.get(i.wrapping_sub(1)), Some(WidgetOp::Unbind(k)) if k == kind),
                "bind of {kind:?} not preceded by unbind"
            );
        }
    }
}

// ============================================================================
// Supersession
// ============================================================================

#[tokio::test]
async fn newer_load_supersedes_slow_resolution() {
    let h = harness();
    h.resolver.script_progressive("ref-slow");
    h.resolver.delay("ref-slow", Duration::from_millis(150));
    h.resolver.script_progressive("ref-fast");

    let slow = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.load_and_play("ref-slow").await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    h.orchestrator.load_and_play("ref-fast").await.unwrap();
    slow.await.unwrap().unwrap();

    // The stale resolution result was discarded: only the fast track's
    // stream reached the media element.
    let session = h.orchestrator.session();
    assert_eq!(session.track_ref, "ref-fast");
    assert_eq!(session.status, PlaybackStatus::Playing);

    let loads = h.media.loads.lock();
    assert_eq!(loads.len(), 1);
    assert!(loads[0].url().contains("ref-fast"));
}

// ============================================================================
// Controls
// ============================================================================

#[tokio::test]
async fn toggle_without_a_session_is_a_noop_with_notice() {
    let h = harness();
    let mut events = h.orchestrator.events().subscribe();

    h.orchestrator.toggle_play_pause().await.unwrap();

    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Idle);
    assert!(matches!(
        events.try_recv(),
        Ok(CoreEvent::Notice(NoticeEvent::NothingToPlay))
    ));
}

#[tokio::test]
async fn toggle_pauses_and_resumes_media_playback() {
    let h = harness();
    h.resolver.script_progressive("ref-a");
    h.orchestrator.load_and_play("ref-a").await.unwrap();

    // Simulate progress, then pause.
    h.media.emit(MediaElementEvent::TimeUpdate {
        position_ms: 17_000,
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    h.orchestrator.toggle_play_pause().await.unwrap();
    let session = h.orchestrator.session();
    assert_eq!(session.status, PlaybackStatus::Paused);
    assert_eq!(session.position_ms, 17_000);
    assert_eq!(h.media.pauses.load(std::sync::atomic::Ordering::SeqCst), 1);

    h.orchestrator.toggle_play_pause().await.unwrap();
    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Playing);
    assert_eq!(h.media.plays.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn seek_is_ignored_while_duration_is_unknown() {
    let h = harness();
    h.resolver.script_progressive("ref-a");
    h.media
        .ready_duration_ms
        .store(0, std::sync::atomic::Ordering::SeqCst);

    h.orchestrator.load_and_play("ref-a").await.unwrap();
    h.orchestrator.seek(5_000).await.unwrap();

    assert!(h.media.seeks.lock().is_empty());
    assert_eq!(h.orchestrator.session().position_ms, 0);
}

#[tokio::test]
async fn seek_clamps_to_duration_and_reaches_adapter() {
    let h = harness();
    h.resolver.script_progressive("ref-a");
    h.orchestrator.load_and_play("ref-a").await.unwrap();

    h.orchestrator.seek(999_000).await.unwrap();

    // Fake reports 180_000 ms duration.
    assert_eq!(h.media.seeks.lock().last().copied(), Some(180_000));
    assert_eq!(h.orchestrator.session().position_ms, 180_000);
}

#[tokio::test]
async fn volume_input_is_clamped_and_parsed() {
    let h = harness();
    h.resolver.script_progressive("ref-a");
    h.orchestrator.load_and_play("ref-a").await.unwrap();

    h.orchestrator.set_volume_input("150").await.unwrap();
    assert_eq!(h.media.volumes.lock().last().copied(), Some(100));

    h.orchestrator.set_volume_input("-10").await.unwrap();
    assert_eq!(h.media.volumes.lock().last().copied(), Some(0));

    h.orchestrator.set_volume_input("abc").await.unwrap();
    assert_eq!(h.media.volumes.lock().last().copied(), Some(0));

    h.orchestrator.set_volume_input("73").await.unwrap();
    assert_eq!(h.media.volumes.lock().last().copied(), Some(73));
}

#[tokio::test]
async fn next_wraps_only_under_repeat_all() {
    let h = harness();
    two_track_playlist(&h);
    h.resolver.script_progressive("ref-0");
    h.resolver.script_progressive("ref-1");

    h.orchestrator.load_and_play("ref-1").await.unwrap();

    // No repeat: boundary is a quiet no-op.
    h.orchestrator.next().await.unwrap();
    assert_eq!(h.orchestrator.session().track_ref, "ref-1");

    // Repeat all: wraps to the first track.
    h.orchestrator.set_repeat(RepeatMode::All).await.unwrap();
    h.orchestrator.next().await.unwrap();
    assert_eq!(h.orchestrator.session().track_ref, "ref-0");
}

// ============================================================================
// Handshake platforms
// ============================================================================

#[tokio::test]
async fn handshake_platform_defers_autoplay_behind_prompt() {
    let h = harness_with(
        PlatformCapabilities::handheld(),
        FakeGate::authenticated(),
        true,
        MemorySettings::new(),
    );
    h.resolver.script_progressive("ref-a");

    let mut events = h.orchestrator.events().subscribe();
    h.orchestrator.load_and_play("ref-a").await.unwrap();

    // Handheld + handshake requirement skips the media transport entirely.
    assert!(h.media.loads.lock().is_empty());
    let loads = h.widget.loads();
    assert_eq!(loads.len(), 1);
    assert!(matches!(
        loads[0],
        WidgetOp::Load {
            auto_play: false,
            ..
        }
    ));

    // Session parks paused behind the prompt.
    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Paused);
    let mut prompted = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, CoreEvent::Notice(NoticeEvent::HandshakeRequired)) {
            prompted = true;
        }
    }
    assert!(prompted);

    // Completing the handshake starts playback.
    h.orchestrator.complete_handshake().await.unwrap();
    assert!(eventually(|| h.widget.commands().contains(&WidgetCommand::Play)).await);
    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Playing);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn pause_persists_and_a_reload_resumes_at_position() {
    let settings = MemorySettings::new();

    // First page load: play and pause mid-track.
    {
        let h = harness_with(
            PlatformCapabilities::desktop(),
            FakeGate::authenticated(),
            true,
            settings.clone(),
        );
        h.resolver.script_progressive("ref-a");
        h.orchestrator.load_and_play("ref-a").await.unwrap();
        h.media.emit(MediaElementEvent::TimeUpdate {
            position_ms: 63_000,
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.orchestrator.toggle_play_pause().await.unwrap();
    }

    // Second page load against the same storage.
    let h = harness_with(
        PlatformCapabilities::desktop(),
        FakeGate::authenticated(),
        true,
        settings,
    );
    h.resolver.script_progressive("ref-a");
    h.orchestrator.initialize().await.unwrap();
    assert!(h.orchestrator.resume().await.unwrap());

    let session = h.orchestrator.session();
    assert_eq!(session.track_ref, "ref-a");
    assert_eq!(session.transport, Transport::Media);
    assert_eq!(session.position_ms, 63_000);
    assert_eq!(h.media.seeks.lock().first().copied(), Some(63_000));
}

#[tokio::test]
async fn deleted_persisted_track_is_cleared_on_next_load_attempt() {
    let settings = MemorySettings::new();
    seed_snapshot(&settings, "id-c", "ref-c", 30_000).await;

    let h = harness_with(
        PlatformCapabilities::desktop(),
        FakeGate::authenticated(),
        true,
        settings.clone(),
    );
    h.resolver.script("ref-c", ScriptedOutcome::Deleted);

    let mut events = h.orchestrator.events().subscribe();
    h.orchestrator.initialize().await.unwrap();
    assert!(h.orchestrator.resume().await.unwrap());

    // Snapshot discarded, not retried.
    assert!(settings.values.lock().get("player.session").is_none());
    assert_eq!(h.resolver.call_count(), 1);
    assert_eq!(h.orchestrator.session().status, PlaybackStatus::Idle);

    let mut unavailable = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(
            event,
            CoreEvent::Notice(NoticeEvent::TrackUnavailable { .. })
        ) {
            unavailable += 1;
        }
    }
    assert_eq!(unavailable, 1);
}

#[tokio::test]
async fn shuffle_and_repeat_prefs_survive_reload() {
    let settings = MemorySettings::new();

    {
        let h = harness_with(
            PlatformCapabilities::desktop(),
            FakeGate::authenticated(),
            true,
            settings.clone(),
        );
        two_track_playlist(&h);
        h.orchestrator.toggle_shuffle().await.unwrap();
        h.orchestrator.set_repeat(RepeatMode::All).await.unwrap();
    }

    let h = harness_with(
        PlatformCapabilities::desktop(),
        FakeGate::authenticated(),
        true,
        settings,
    );
    two_track_playlist(&h);
    h.orchestrator.initialize().await.unwrap();

    h.resolver.script_progressive("ref-0");
    h.resolver.script_progressive("ref-1");
    h.orchestrator.load_and_play("ref-1").await.unwrap();

    // Repeat=all was restored: next() from the last track wraps.
    h.orchestrator.next().await.unwrap();
    assert_ne!(h.orchestrator.session().track_ref, "ref-1");
}

// ============================================================================
// Helpers
// ============================================================================

async fn seed_snapshot(
    settings: &Arc<MemorySettings>,
    track_id: &str,
    track_ref: &str,
    position_ms: u64,
) {
    use bridge_traits::storage::SettingsStore;
    let snapshot = serde_json::json!({
        "track_id": track_id,
        "track_ref": track_ref,
        "position_ms": position_ms,
        "duration_ms": 240_000,
        "transport": "media",
        "is_playing": true,
        "saved_at_ms": 1_700_000_000_000i64,
    });
    settings
        .set_string("player.session", &snapshot.to_string())
        .await
        .unwrap();
}
