//! Media Element Host Abstraction
//!
//! Wraps the single playable media element the host page owns. The core's
//! media adapter drives this trait for both progressive files and
//! adaptive-bitrate streams; the segmented attach step is provided by the
//! host (e.g. an HLS library bound to the element) and only *driven* from
//! here.
//!
//! Implementations own exactly one underlying element. Loading a new source
//! implicitly replaces the previous one; `detach` releases the element
//! entirely so another transport may claim the audio output.

use async_trait::async_trait;

use crate::error::Result;

/// Source descriptor handed to the media element host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Single-file audio URL playable directly by the element.
    Progressive { url: String },
    /// Adaptive-bitrate manifest requiring the host's segmented-streaming
    /// primitive to be attached to the element before playback.
    Segmented { manifest_url: String },
}

impl MediaSource {
    pub fn url(&self) -> &str {
        match self {
            MediaSource::Progressive { url } => url,
            MediaSource::Segmented { manifest_url } => manifest_url,
        }
    }

    pub fn is_segmented(&self) -> bool {
        matches!(self, MediaSource::Segmented { .. })
    }
}

/// Events emitted by the media element.
///
/// This is the canonical vocabulary the core consumes; hosts map their
/// native element events onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaElementEvent {
    /// Metadata is loaded and the element can begin playback.
    Ready { duration_ms: u64 },
    /// Playback started or resumed.
    Play,
    /// Playback paused.
    Pause,
    /// Position advanced during playback.
    TimeUpdate { position_ms: u64 },
    /// Stream finished naturally.
    Ended,
    /// The element or its source failed.
    Error { message: String },
}

/// Stream of media element events.
///
/// Returns `None` once the subscription is closed (element detached).
#[async_trait]
pub trait MediaEventStream: Send {
    async fn next(&mut self) -> Option<MediaElementEvent>;
}

/// Host-owned media element.
///
/// All operations are asynchronous and non-blocking. `play` mirrors the
/// element's play() promise: it resolves when playback is permitted to
/// start and fails when the platform refuses (e.g. autoplay policy).
#[async_trait]
pub trait MediaElementHost: Send + Sync {
    /// Load a source into the element. For [`MediaSource::Segmented`] the
    /// host attaches its streaming primitive to the element *before*
    /// setting the source.
    async fn load(&self, source: MediaSource) -> Result<()>;

    /// Release the element: stop playback, clear the source, and detach any
    /// segmented-streaming primitive.
    async fn detach(&self) -> Result<()>;

    /// Begin or resume playback. Fails if the platform rejects the attempt.
    async fn play(&self) -> Result<()>;

    /// Pause playback without releasing the element.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&self, position_ms: u64) -> Result<()>;

    /// Set the element volume. `percent` is pre-clamped to `0..=100` by the
    /// caller. Hosts on platforms with hardware-controlled volume may
    /// implement this as a no-op; capability detection lives in
    /// [`PlatformCapabilities`](crate::platform::PlatformCapabilities), not here.
    async fn set_volume(&self, percent: u8) -> Result<()>;

    /// Current playback position.
    async fn position_ms(&self) -> Result<u64>;

    /// Known stream duration, 0 while unknown.
    async fn duration_ms(&self) -> Result<u64>;

    /// Subscribe to element events. Subscriptions end when the element is
    /// detached.
    async fn subscribe_events(&self) -> Result<Box<dyn MediaEventStream>>;
}
