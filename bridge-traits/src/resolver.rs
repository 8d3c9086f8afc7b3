//! Track Resolution Contract
//!
//! The external resolution endpoint turns an opaque track reference into a
//! playable stream descriptor, or reports that the track is gone. This
//! trait is the seam between the playback core and whichever connector
//! reaches the endpoint (see the `provider-tracks` crate for the HTTP
//! implementation).

use async_trait::async_trait;

use crate::error::Result;

/// A successfully resolved, playable stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableStream {
    /// URL playable by the media element (directly, or via the segmented
    /// streaming primitive).
    pub playable_url: String,
    /// Whether the URL is an adaptive-bitrate manifest requiring the
    /// segmented attach step.
    pub is_segmented: bool,
}

/// Classification of a resolution attempt that produced a definitive
/// answer.
///
/// Transient failures (network errors, 5xx responses) are NOT a
/// `Resolution`; they surface as the `Err` arm of [`TrackResolver::resolve`]
/// and may be retried or trigger fallback. `Deleted` is terminal for the
/// track and must never be retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Playable(PlayableStream),
    Deleted,
}

/// Client proxy for the stream resolution endpoint.
///
/// Pure request/classify: implementations perform a single request and
/// classify the outcome; retry policy belongs to callers.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolve a track reference.
    ///
    /// # Errors
    ///
    /// Returns an error for transient failures only (network failure,
    /// non-gone non-success status). A gone track is `Ok(Resolution::Deleted)`.
    async fn resolve(&self, track_ref: &str) -> Result<Resolution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playable_stream_fields() {
        let stream = PlayableStream {
            playable_url: "https://cdn.example.com/a.m3u8".into(),
            is_segmented: true,
        };
        assert!(matches!(
            Resolution::Playable(stream.clone()),
            Resolution::Playable(_)
        ));
        assert_ne!(Resolution::Playable(stream), Resolution::Deleted);
    }
}
