//! # Core Configuration Module
//!
//! Provides configuration management for the Stream Player Core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CoreConfig` instance holding the bridge implementations and tunables
//! the playback engine needs. It enforces fail-fast validation so a
//! missing bridge is a descriptive construction error rather than a crash
//! mid-playback.
//!
//! ## Required Dependencies
//!
//! - `MediaElementHost` - The page's single media element
//! - `WidgetHost` - The embeddable widget iframe
//! - `SettingsStore` - Durable resume-state/preference storage
//! - `HttpClient` - HTTP operations for the resolution endpoint
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `SecureStore` - Credential persistence (absent: widget-only transport)
//! - `PageLifecycleObserver` - Page hide/show (absent: ticker never paused)
//! - `Clock` - Time source (default: system clock)
//! - `PlatformCapabilities` - Platform quirks (default: desktop)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_host(Arc::new(PageMediaElement::new()))
//!     .widget_host(Arc::new(PageWidget::new()))
//!     .settings_store(Arc::new(MySettings))
//!     .http_client(Arc::new(MyHttpClient))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    Clock, HttpClient, MediaElementHost, PageLifecycleObserver, PlatformCapabilities, SecureStore,
    SettingsStore, SystemClock, WidgetHost,
};
use std::sync::Arc;
use std::time::Duration;

/// Tunable durations and thresholds for the playback engine.
#[derive(Debug, Clone)]
pub struct PlayerTuning {
    /// How long the media adapter waits for the ready signal before the
    /// start attempt counts as failed.
    pub ready_timeout: Duration,

    /// Minimum interval between throttled position persists.
    pub persist_interval: Duration,

    /// Progress ticker period while a track is playing.
    pub ticker_period: Duration,

    /// Viewport width at which the UI switches to compact rows.
    pub breakpoint_px: u32,

    /// Event bus buffer size.
    pub event_buffer: usize,

    /// Whether the widget iframe is shown when it drives playback. False
    /// when the custom UI renders all controls and the widget is purely an
    /// audio engine.
    pub widget_visible: bool,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(10),
            persist_interval: Duration::from_secs(1),
            ticker_period: Duration::from_millis(500),
            breakpoint_px: 768,
            event_buffer: 100,
            widget_visible: false,
        }
    }
}

/// Core configuration for the Stream Player Core.
///
/// Holds the bridges and tunables required to initialize the playback
/// engine. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// The page's single media element.
    pub media_host: Arc<dyn MediaElementHost>,

    /// The embeddable widget iframe.
    pub widget_host: Arc<dyn WidgetHost>,

    /// Durable key-value storage for resume state and preferences.
    pub settings_store: Arc<dyn SettingsStore>,

    /// HTTP client for the resolution endpoint.
    pub http_client: Arc<dyn HttpClient>,

    /// Secure storage for the API credential, when the host provides one.
    pub secure_store: Option<Arc<dyn SecureStore>>,

    /// Page lifecycle observer, when the host provides one.
    pub lifecycle: Option<Arc<dyn PageLifecycleObserver>>,

    /// Time source.
    pub clock: Arc<dyn Clock>,

    /// Platform quirks, computed once at startup.
    pub capabilities: PlatformCapabilities,

    /// Engine tunables.
    pub tuning: PlayerTuning,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("media_host", &"<dyn MediaElementHost>")
            .field("widget_host", &"<dyn WidgetHost>")
            .field("settings_store", &"<dyn SettingsStore>")
            .field("http_client", &"<dyn HttpClient>")
            .field("secure_store", &self.secure_store.as_ref().map(|_| "<dyn SecureStore>"))
            .field("lifecycle", &self.lifecycle.as_ref().map(|_| "<dyn PageLifecycleObserver>"))
            .field("clock", &"<dyn Clock>")
            .field("capabilities", &self.capabilities)
            .field("tuning", &self.tuning)
            .finish()
    }
}

impl CoreConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`] with fail-fast validation.
#[derive(Default)]
pub struct CoreConfigBuilder {
    media_host: Option<Arc<dyn MediaElementHost>>,
    widget_host: Option<Arc<dyn WidgetHost>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    lifecycle: Option<Arc<dyn PageLifecycleObserver>>,
    clock: Option<Arc<dyn Clock>>,
    capabilities: Option<PlatformCapabilities>,
    tuning: Option<PlayerTuning>,
}

impl CoreConfigBuilder {
    pub fn media_host(mut self, host: Arc<dyn MediaElementHost>) -> Self {
        self.media_host = Some(host);
        self
    }

    pub fn widget_host(mut self, host: Arc<dyn WidgetHost>) -> Self {
        self.widget_host = Some(host);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn lifecycle(mut self, observer: Arc<dyn PageLifecycleObserver>) -> Self {
        self.lifecycle = Some(observer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn tuning(mut self, tuning: PlayerTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] with an actionable message when
    /// a required bridge was not provided.
    pub fn build(self) -> Result<CoreConfig> {
        let media_host = self.media_host.ok_or_else(|| Error::CapabilityMissing {
            capability: "MediaElementHost".to_string(),
            message: "No media element host provided. Bind the page's audio element \
                      through bridge_traits::media::MediaElementHost."
                .to_string(),
        })?;

        let widget_host = self.widget_host.ok_or_else(|| Error::CapabilityMissing {
            capability: "WidgetHost".to_string(),
            message: "No widget host provided. Bind the embed iframe through \
                      bridge_traits::widget::WidgetHost."
                .to_string(),
        })?;

        let settings_store = self.settings_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "SettingsStore".to_string(),
            message: "No settings store provided. Resume state and preferences \
                      require durable storage."
                .to_string(),
        })?;

        let http_client = self.http_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "No HTTP client provided. Desktop hosts: use \
                      bridge_desktop::ReqwestHttpClient."
                .to_string(),
        })?;

        Ok(CoreConfig {
            media_host,
            widget_host,
            settings_store,
            http_client,
            secure_store: self.secure_store,
            lifecycle: self.lifecycle,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            capabilities: self.capabilities.unwrap_or_default(),
            tuning: self.tuning.unwrap_or_default(),
        })
    }
}
