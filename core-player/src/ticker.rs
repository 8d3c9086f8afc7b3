//! Progress Ticker
//!
//! The repeating timer behind progress tracking, modeled as an explicitly
//! owned resource: started only after a successful transition into a
//! playing state, stopped on pause/teardown/page-hide, restarted on
//! page-show. Never a free-running interval.
//!
//! Each tick publishes the latest adapter-reported position to the
//! session, emits a `PositionChanged` event for the UI, and hands the
//! snapshot to the throttled persistence store.

use crate::persistence::PersistenceStore;
use crate::session::{PlaybackSession, PositionCell};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Resources a ticker run needs.
#[derive(Clone)]
pub struct TickerShared {
    pub cell: Arc<PositionCell>,
    pub session: Arc<RwLock<PlaybackSession>>,
    pub bus: EventBus,
    pub persistence: Arc<PersistenceStore>,
}

/// Owned start/stop progress timer.
pub struct ProgressTicker {
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: Mutex::new(None),
        }
    }

    /// Start ticking. A previous run, if any, is stopped first so at most
    /// one timer exists.
    pub fn start(&self, shared: TickerShared) {
        self.stop();

        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick(&shared).await;
            }
        });

        *self.handle.lock() = Some(task);
        debug!("Progress ticker started");
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&self) {
        if let Some(task) = self.handle.lock().take() {
            task.abort();
            debug!("Progress ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick(shared: &TickerShared) {
    let snapshot = {
        let mut session = shared.session.write();
        let duration_ms = shared.cell.duration_ms();
        if duration_ms > 0 {
            session.duration_ms = duration_ms;
        }
        session.set_position(shared.cell.position_ms());
        session.clone()
    };

    shared
        .bus
        .emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
            track_id: snapshot.track_id.clone(),
            position_ms: snapshot.position_ms,
            duration_ms: snapshot.duration_ms,
        }))
        .ok();

    if let Err(e) = shared.persistence.save(&snapshot).await {
        debug!("Throttled persist failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::PlaybackStatus;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::storage::SettingsStore;
    use bridge_traits::time::SystemClock;
    use core_runtime::events::Transport;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySettings {
        values: Mutex<HashMap<String, String>>,
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
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn shared() -> (TickerShared, EventBus) {
        let bus = EventBus::new(100);
        let session = PlaybackSession {
            track_id: "id-1".into(),
            track_ref: "ref-1".into(),
            transport: Transport::Media,
            status: PlaybackStatus::Playing,
            position_ms: 0,
            duration_ms: 0,
            volume: Default::default(),
        };
        let shared = TickerShared {
            cell: Arc::new(PositionCell::new()),
            session: Arc::new(RwLock::new(session)),
            bus: bus.clone(),
            persistence: Arc::new(PersistenceStore::new(
                Arc::new(MemorySettings::default()),
                Arc::new(SystemClock),
                Duration::from_secs(1),
            )),
        };
        (shared, bus)
    }

    #[tokio::test]
    async fn tick_publishes_cell_position() {
        let (shared, bus) = shared();
        let mut sub = bus.subscribe();

        shared.cell.set_position(7_000);
        shared.cell.set_duration(180_000);
        tick(&shared).await;

        assert_eq!(shared.session.read().position_ms, 7_000);
        assert_eq!(shared.session.read().duration_ms, 180_000);

        match sub.recv().await.unwrap() {
            CoreEvent::Playback(PlaybackEvent::PositionChanged {
                position_ms,
                duration_ms,
                ..
            }) => {
                assert_eq!(position_ms, 7_000);
                assert_eq!(duration_ms, 180_000);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_stop_lifecycle() {
        let (shared, _bus) = shared();
        let ticker = ProgressTicker::new(Duration::from_millis(10));

        assert!(!ticker.is_running());
        ticker.start(shared.clone());
        assert!(ticker.is_running());

        // Restart replaces the previous run instead of stacking timers.
        ticker.start(shared);
        assert!(ticker.is_running());

        ticker.stop();
        assert!(!ticker.is_running());
        ticker.stop();
    }
}
