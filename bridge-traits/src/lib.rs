//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait represents a capability
//! the core requires but that must be implemented differently per host
//! (browser page, desktop shell, mobile webview).
//!
//! ## Traits
//!
//! ### Playback Surfaces
//! - [`MediaElementHost`](media::MediaElementHost) - The single playable media element
//! - [`WidgetHost`](widget::WidgetHost) - The embeddable third-party widget iframe
//!
//! ### Networking & Resolution
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations
//! - [`AuthHeaderProvider`](http::AuthHeaderProvider) - Credential header supplier
//! - [`TrackResolver`](resolver::TrackResolver) - Track reference → playable stream
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value preferences/resume state
//! - [`SecureStore`](storage::SecureStore) - Credential persistence
//!
//! ### Platform Integration
//! - [`PlatformCapabilities`](platform::PlatformCapabilities) - Autoplay/volume/handshake quirks
//! - [`PageLifecycleObserver`](lifecycle::PageLifecycleObserver) - Page hide/show transitions
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability
//! is missing; see `core-runtime`'s configuration builder.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe
//! concurrent usage across async tasks.

pub mod error;
pub mod http;
pub mod lifecycle;
pub mod media;
pub mod platform;
pub mod resolver;
pub mod storage;
pub mod time;
pub mod widget;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{AuthHeaderProvider, HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use lifecycle::{PageLifecycleObserver, PageVisibility, PageVisibilityStream};
pub use media::{MediaElementEvent, MediaElementHost, MediaEventStream, MediaSource};
pub use platform::PlatformCapabilities;
pub use resolver::{PlayableStream, Resolution, TrackResolver};
pub use storage::{SecureStore, SettingsStore};
pub use time::{Clock, SystemClock};
pub use widget::{
    WidgetCommand, WidgetEvent, WidgetEventKind, WidgetEventStream, WidgetHost, WidgetLoadOptions,
};
