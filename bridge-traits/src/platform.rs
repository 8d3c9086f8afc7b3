//! Platform Capability Detection
//!
//! Platform quirks (autoplay policy, hardware volume, widget handshake
//! requirements) are computed once at startup into a single value object
//! and injected into the adapters. Nothing in the core re-detects the
//! platform inline.

use serde::{Deserialize, Serialize};

/// Capabilities of the current platform/configuration combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Whether audio may start without a preceding user gesture. When
    /// false, the media adapter must prime the element inside a gesture
    /// before any non-gesture playback attempt.
    pub can_autoplay_unprompted: bool,

    /// Whether the volume API is honored. iOS-class platforms control
    /// volume in hardware; the UI suppresses volume affordances when this
    /// is false rather than silently failing.
    pub supports_volume_api: bool,

    /// Whether widget-based autoplay requires an explicit user-gesture
    /// handshake before it is permitted.
    pub requires_widget_handshake: bool,
}

impl PlatformCapabilities {
    /// Desktop-class platform: no autoplay restrictions, full volume API.
    pub fn desktop() -> Self {
        Self {
            can_autoplay_unprompted: true,
            supports_volume_api: true,
            requires_widget_handshake: false,
        }
    }

    /// iOS-class handheld platform: gesture-gated audio, hardware volume,
    /// widget handshake required.
    pub fn handheld() -> Self {
        Self {
            can_autoplay_unprompted: false,
            supports_volume_api: false,
            requires_widget_handshake: true,
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::desktop()
    }
}
