//! Media Transport Adapter
//!
//! Drives the host's single media element for progressive files and
//! segmented streams. Owns the platform unlock quirks: gesture priming on
//! platforms that forbid unprompted audio, and volume suppression where
//! volume is hardware-controlled.
//!
//! `start` resolves only after the element signals readiness; a play
//! rejection or an error event before readiness fails the start, which is
//! the trigger for the orchestrator's one-shot widget fallback.

use crate::error::{PlayerError, Result};
use crate::session::{PositionCell, Volume};
use bridge_traits::media::{MediaElementEvent, MediaElementHost, MediaEventStream, MediaSource};
use bridge_traits::platform::PlatformCapabilities;
use bridge_traits::resolver::PlayableStream;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, Transport};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Everything `start` needs to begin playback.
#[derive(Debug, Clone)]
pub struct StartSpec {
    pub stream: PlayableStream,
    /// Position to resume from, 0 for the beginning.
    pub resume_ms: u64,
    /// Volume to apply before playback (ignored on hardware-volume
    /// platforms).
    pub volume: Volume,
}

/// Adapter for the direct media element transport.
pub struct MediaAdapter {
    host: Arc<dyn MediaElementHost>,
    caps: PlatformCapabilities,
    bus: EventBus,
    cell: Arc<PositionCell>,
    track_id: String,
    ready_timeout: Duration,
    primed: AtomicBool,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl MediaAdapter {
    pub fn new(
        host: Arc<dyn MediaElementHost>,
        caps: PlatformCapabilities,
        bus: EventBus,
        cell: Arc<PositionCell>,
        track_id: impl Into<String>,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            host,
            caps,
            bus,
            cell,
            track_id: track_id.into(),
            ready_timeout,
            primed: AtomicBool::new(false),
            pump: Mutex::new(None),
        }
    }

    /// Whether the volume API is honored on this platform.
    pub fn volume_controllable(&self) -> bool {
        self.caps.supports_volume_api
    }

    /// Unlock the element for non-gesture playback by running a silent
    /// play/pause cycle. Must be reached from within a user gesture on
    /// platforms that gate audio; idempotent and safe to call any number
    /// of times.
    pub async fn prime(&self) -> Result<()> {
        if self.caps.can_autoplay_unprompted {
            return Ok(());
        }
        if self.primed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let cycle = async {
            self.host.play().await?;
            self.host.pause().await
        };

        if let Err(e) = cycle.await {
            // Un-mark so a later gesture can retry the unlock.
            self.primed.store(false, Ordering::SeqCst);
            debug!("Priming cycle failed: {}", e);
            return Err(PlayerError::Bridge(e));
        }

        debug!("Media element primed");
        Ok(())
    }

    /// Load the stream, wait for readiness, seek to the resume position,
    /// and begin playback.
    ///
    /// # Errors
    ///
    /// [`PlayerError::MediaStartFailed`] when the element rejects the
    /// source or the play attempt, [`PlayerError::MediaReadyTimeout`] when
    /// readiness never arrives. Both trigger the widget fallback upstream.
    #[instrument(skip(self, spec), fields(track_id = %self.track_id, segmented = spec.stream.is_segmented))]
    pub async fn start(&self, spec: StartSpec) -> Result<()> {
        let mut events = self.host.subscribe_events().await?;

        if !self.caps.can_autoplay_unprompted {
            // Best effort: a failed prime surfaces as a play rejection
            // below, which is the fallback trigger anyway.
            self.prime().await.ok();
        }

        let source = if spec.stream.is_segmented {
            MediaSource::Segmented {
                manifest_url: spec.stream.playable_url.clone(),
            }
        } else {
            MediaSource::Progressive {
                url: spec.stream.playable_url.clone(),
            }
        };

        self.host
            .load(source)
            .await
            .map_err(|e| PlayerError::MediaStartFailed(e.to_string()))?;

        let duration_ms = self.wait_ready(&mut *events).await?;
        self.cell.reset();
        self.cell.set_duration(duration_ms);

        if spec.resume_ms > 0 {
            self.host
                .seek(spec.resume_ms)
                .await
                .map_err(|e| PlayerError::MediaStartFailed(e.to_string()))?;
            self.cell.set_position(spec.resume_ms);
        }

        if let Err(e) = self.set_volume(spec.volume).await {
            warn!("Could not apply volume before start: {}", e);
        }

        self.host
            .play()
            .await
            .map_err(|e| PlayerError::MediaStartFailed(e.to_string()))?;

        self.bus
            .emit(CoreEvent::Playback(PlaybackEvent::Ready {
                track_id: self.track_id.clone(),
                transport: Transport::Media,
                duration_ms,
            }))
            .ok();

        self.spawn_pump(events);
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        self.host.pause().await.map_err(PlayerError::Bridge)
    }

    pub async fn resume(&self) -> Result<()> {
        self.host.play().await.map_err(PlayerError::Bridge)
    }

    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        self.host
            .seek(position_ms)
            .await
            .map_err(PlayerError::Bridge)?;
        self.cell.set_position(position_ms);
        Ok(())
    }

    /// Apply a volume. Suppressed (not an error) on platforms where
    /// volume is hardware-controlled; the UI hides volume affordances via
    /// [`volume_controllable`](Self::volume_controllable) instead.
    pub async fn set_volume(&self, volume: Volume) -> Result<()> {
        if !self.caps.supports_volume_api {
            debug!("Volume API unsupported on this platform, suppressing");
            return Ok(());
        }
        self.host
            .set_volume(volume.percent())
            .await
            .map_err(PlayerError::Bridge)
    }

    /// Tear the transport down: the event pump is detached synchronously
    /// so no stale event reaches the UI, then the element is released.
    pub async fn teardown(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        if let Err(e) = self.host.detach().await {
            warn!("Media element detach failed: {}", e);
        }
        debug!(track_id = %self.track_id, "Media transport torn down");
    }

    async fn wait_ready(&self, events: &mut dyn MediaEventStream) -> Result<u64> {
        let ready_wait = async {
            loop {
                match events.next().await {
                    Some(MediaElementEvent::Ready { duration_ms }) => return Ok(duration_ms),
                    Some(MediaElementEvent::Error { message }) => {
                        return Err(PlayerError::MediaStartFailed(message))
                    }
                    // Pre-ready noise (e.g. a pause from priming) is not
                    // meaningful yet.
                    Some(_) => continue,
                    None => {
                        return Err(PlayerError::MediaStartFailed(
                            "media event stream closed before readiness".to_string(),
                        ))
                    }
                }
            }
        };

        match timeout(self.ready_timeout, ready_wait).await {
            Ok(result) => result,
            Err(_) => Err(PlayerError::MediaReadyTimeout(self.ready_timeout)),
        }
    }

    fn spawn_pump(&self, mut events: Box<dyn MediaEventStream>) {
        let bus = self.bus.clone();
        let cell = self.cell.clone();
        let track_id = self.track_id.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    MediaElementEvent::TimeUpdate { position_ms } => {
                        cell.set_position(position_ms);
                    }
                    MediaElementEvent::Play => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Resumed {
                            track_id: track_id.clone(),
                            position_ms: cell.position_ms(),
                        }))
                        .ok();
                    }
                    MediaElementEvent::Pause => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Paused {
                            track_id: track_id.clone(),
                            position_ms: cell.position_ms(),
                        }))
                        .ok();
                    }
                    MediaElementEvent::Ended => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Ended {
                            track_id: track_id.clone(),
                        }))
                        .ok();
                    }
                    MediaElementEvent::Error { message } => {
                        bus.emit(CoreEvent::Playback(PlaybackEvent::Error {
                            track_id: Some(track_id.clone()),
                            transport: Transport::Media,
                            message,
                            recoverable: false,
                        }))
                        .ok();
                    }
                    MediaElementEvent::Ready { duration_ms } => {
                        // Late metadata refresh (e.g. live manifest update).
                        cell.set_duration(duration_ms);
                    }
                }
            }
        });

        *self.pump.lock() = Some(task);
    }
}
