//! # Event Bus System
//!
//! Provides an event-driven architecture for the Stream Player Core using
//! `tokio::sync::broadcast`. This module enables decoupled communication
//! between the playback orchestrator, the UI sync layer, and any external
//! observer on the page.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for playback and notices
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Orchestrator ├──────────────>│           │
//! └──────────────┘               │ EventBus  │     subscribe    ┌──────────────┐
//!                                │ (broadcast├─────────────────>│ UI Sync      │
//! ┌──────────────┐     emit      │  channel) │                  └──────────────┘
//! │ Adapters     ├──────────────>│           │     subscribe    ┌──────────────┐
//! └──────────────┘               └───────────┘─────────────────>│ Host page    │
//!                                                               └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, PlaybackEvent, Transport};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! let event = CoreEvent::Playback(PlaybackEvent::Started {
//!     track_id: "track-123".to_string(),
//!     title: Some("Example".to_string()),
//!     artist: None,
//!     transport: Transport::Media,
//! });
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Error Handling
//!
//! The bus uses `tokio::sync::broadcast`, which can produce two receive
//! errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n`
//!   events. Non-fatal; the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: All senders were dropped. Treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position updates dominate event volume; one buffer slot per tick gives
/// slow subscribers several seconds of slack before they lag.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Which playback technology is currently driving audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// No transport attached (idle session).
    None,
    /// Direct media element pipeline (progressive or segmented).
    Media,
    /// Embeddable third-party widget.
    Widget,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::None => "none",
            Transport::Media => "media",
            Transport::Widget => "widget",
        }
    }

    /// Whether a transport is attached at all.
    pub fn is_attached(&self) -> bool {
        !matches!(self, Transport::None)
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback lifecycle events
    Playback(PlaybackEvent),
    /// User-visible notices
    Notice(NoticeEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Notice(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Notice(NoticeEvent::PlaybackFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Notice(NoticeEvent::TrackUnavailable { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Fallback { .. }) => EventSeverity::Info,
            CoreEvent::Notice(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to playback lifecycle and progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The active transport finished preparing and can play.
    Ready {
        /// The track ID being prepared.
        track_id: String,
        /// The transport that became ready.
        transport: Transport,
        /// Stream duration (milliseconds), 0 while unknown.
        duration_ms: u64,
    },
    /// Playback started for a track.
    Started {
        /// The track ID being played.
        track_id: String,
        /// Display title, when the playlist knows it.
        title: Option<String>,
        /// Display artist, when the playlist knows it.
        artist: Option<String>,
        /// The transport driving audio.
        transport: Transport,
    },
    /// Playback paused.
    Paused {
        /// The track ID.
        track_id: String,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Playback resumed after pause.
    Resumed {
        /// The track ID.
        track_id: String,
        /// Position when resumed (milliseconds).
        position_ms: u64,
    },
    /// Playback position advanced (ticker or seek).
    PositionChanged {
        /// The track ID.
        track_id: String,
        /// New position (milliseconds).
        position_ms: u64,
        /// Track duration (milliseconds), 0 while unknown.
        duration_ms: u64,
    },
    /// Track finished playing naturally.
    Ended {
        /// The track ID that completed.
        track_id: String,
    },
    /// Media transport failed before playback; widget transport takes over.
    Fallback {
        /// The track ID being recovered.
        track_id: String,
        /// Position carried into the widget transport (milliseconds).
        resume_ms: u64,
    },
    /// Playback stopped and the session went idle.
    Stopped {
        /// The track ID.
        track_id: String,
    },
    /// Playback error occurred.
    Error {
        /// The track ID if available.
        track_id: Option<String>,
        /// The transport that produced the error.
        transport: Transport,
        /// Human-readable error message.
        message: String,
        /// Whether playback can be retried.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Ready { .. } => "Transport ready",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::Ended { .. } => "Track completed",
            PlaybackEvent::Fallback { .. } => "Fell back to widget transport",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Notice Events
// ============================================================================

/// User-visible notices. Hosts render these through a single consistent
/// notification surface instead of scattering alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NoticeEvent {
    /// The requested track no longer exists at the streaming service.
    TrackUnavailable {
        /// The track ID that resolved as gone.
        track_id: String,
    },
    /// The viewer must log in before playback can start.
    LoginRequired,
    /// A control was used while nothing was loaded or still resolving.
    NothingToPlay,
    /// Playback could not be started or continued.
    PlaybackFailed {
        /// Human-readable error message.
        message: String,
    },
    /// The platform requires a one-time interaction before widget autoplay.
    HandshakeRequired,
    /// The handshake prompt was completed or cancelled.
    HandshakeDismissed,
}

impl NoticeEvent {
    fn description(&self) -> &str {
        match self {
            NoticeEvent::TrackUnavailable { .. } => "Track unavailable",
            NoticeEvent::LoginRequired => "Login required",
            NoticeEvent::NothingToPlay => "Nothing to play",
            NoticeEvent::PlaybackFailed { .. } => "Playback failed",
            NoticeEvent::HandshakeRequired => "Interaction required to start playback",
            NoticeEvent::HandshakeDismissed => "Interaction prompt dismissed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned per subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, CoreEvent, NoticeEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut subscriber = event_bus.subscribe();
///
/// event_bus.emit(CoreEvent::Notice(NoticeEvent::LoginRequired)).ok();
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events buffered per subscriber.
    ///   When a subscriber falls behind by more than this amount, it
    ///   receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive future events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let notices = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Notice(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream. Only matching events are
    /// returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
