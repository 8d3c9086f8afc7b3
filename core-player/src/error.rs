//! # Player Error Types
//!
//! Error taxonomy for the playback engine. The four families matter to
//! callers in different ways: deletion is terminal, transient failures are
//! retryable, playback-start failures trigger the one-shot widget
//! fallback, and configuration failures abort the operation without
//! crashing the page.

use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// Track no longer exists at the streaming service. Terminal: never
    /// retried, never falls back.
    #[error("Track deleted: {0}")]
    TrackDeleted(String),

    /// Resolution failed for a retryable reason (network, server error).
    #[error("Resolution failed: {0}")]
    ResolutionFailed(String),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The media transport could not start. Triggers exactly one fallback
    /// to the widget transport.
    #[error("Media transport failed to start: {0}")]
    MediaStartFailed(String),

    /// The media element readiness signal never arrived.
    #[error("Media transport not ready within {0:?}")]
    MediaReadyTimeout(std::time::Duration),

    /// The widget transport failed; there is no further fallback.
    #[error("Widget transport failed: {0}")]
    WidgetFailed(String),

    /// A transport error occurred mid-playback.
    #[error("Playback error on {transport}: {message}")]
    PlaybackFailed { transport: String, message: String },

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// A control was used while no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    // ========================================================================
    // Configuration / Persistence
    // ========================================================================
    /// A required host surface is missing or broken.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Durable storage failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Bridge-level failure.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl PlayerError {
    /// Returns `true` if the operation may be retried by the user.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlayerError::ResolutionFailed(_)
                | PlayerError::PlaybackFailed { .. }
                | PlayerError::Persistence(_)
                | PlayerError::Bridge(_)
        )
    }

    /// Returns `true` if the error should trigger the media→widget
    /// fallback when it occurs during transport start.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            PlayerError::MediaStartFailed(_) | PlayerError::MediaReadyTimeout(_)
        )
    }

    /// Returns `true` if the track itself is gone and nothing should be
    /// attempted again for it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerError::TrackDeleted(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn classification_helpers() {
        assert!(PlayerError::TrackDeleted("t".into()).is_terminal());
        assert!(!PlayerError::TrackDeleted("t".into()).is_transient());
        assert!(!PlayerError::TrackDeleted("t".into()).triggers_fallback());

        assert!(PlayerError::MediaStartFailed("rejected".into()).triggers_fallback());
        assert!(PlayerError::MediaReadyTimeout(Duration::from_secs(10)).triggers_fallback());
        assert!(!PlayerError::WidgetFailed("x".into()).triggers_fallback());

        assert!(PlayerError::ResolutionFailed("503".into()).is_transient());
    }
}
