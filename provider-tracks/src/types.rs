//! Wire types for the stream resolution endpoint.

use serde::Deserialize;

/// Delivery protocol reported by the resolution endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    /// Single-file URL playable directly by a media element.
    #[default]
    Progressive,
    /// Adaptive-bitrate manifest requiring the segmented attach step.
    Hls,
}

impl StreamProtocol {
    pub fn is_segmented(&self) -> bool {
        matches!(self, StreamProtocol::Hls)
    }
}

/// Successful resolution payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedTrackPayload {
    /// The playable stream URL.
    pub stream_url: String,
    /// Delivery protocol; endpoints that omit it serve progressive files.
    #[serde(default)]
    pub protocol: StreamProtocol,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_payload() {
        let payload: ResolvedTrackPayload = serde_json::from_str(
            r#"{"stream_url": "https://cdn.example.com/t.m3u8", "protocol": "hls"}"#,
        )
        .unwrap();
        assert_eq!(payload.stream_url, "https://cdn.example.com/t.m3u8");
        assert!(payload.protocol.is_segmented());
    }

    #[test]
    fn missing_protocol_defaults_to_progressive() {
        let payload: ResolvedTrackPayload =
            serde_json::from_str(r#"{"stream_url": "https://cdn.example.com/t.mp3"}"#).unwrap();
        assert!(!payload.protocol.is_segmented());
    }
}
