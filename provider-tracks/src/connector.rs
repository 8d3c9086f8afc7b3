//! Stream resolution endpoint connector
//!
//! Implements the `TrackResolver` trait against the streaming service's
//! HTTP resolution endpoint.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{AuthHeaderProvider, HttpClient, HttpMethod, HttpRequest};
use bridge_traits::resolver::{PlayableStream, Resolution, TrackResolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::ResolverError;
use crate::probe::{DeletionProbe, StatusDeletionProbe};
use crate::types::ResolvedTrackPayload;

/// Request timeout for resolution calls.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP connector for the stream resolution endpoint.
///
/// Pure request/classify: performs a single request per `resolve` call and
/// maps the outcome onto the resolution taxonomy. Retry policy belongs to
/// callers; a gone track must never be retried, a transient failure may
/// be.
///
/// # Classification
///
/// | Endpoint outcome | Result |
/// |---|---|
/// | 2xx with payload | `Ok(Resolution::Playable)` |
/// | Deletion probe match (default 404/410) | `Ok(Resolution::Deleted)` |
/// | Any other non-success | `Err` (transient) |
/// | Network failure | `Err` (transient) |
///
/// # Example
///
/// ```ignore
/// use provider_tracks::HttpTrackResolver;
/// use bridge_traits::resolver::TrackResolver;
///
/// let resolver = HttpTrackResolver::new(http_client, headers, "https://api.example.com");
/// let resolution = resolver.resolve("https://service.example.com/artist/track").await?;
/// ```
pub struct HttpTrackResolver {
    /// HTTP client for endpoint requests.
    http_client: Arc<dyn HttpClient>,

    /// Supplier of API-mode auth headers; empty set when no credential.
    headers: Arc<dyn AuthHeaderProvider>,

    /// Resolution endpoint base URL.
    endpoint: String,

    /// Deletion classification predicate.
    probe: Arc<dyn DeletionProbe>,
}

impl HttpTrackResolver {
    /// Create a connector with the default status-code deletion probe.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        headers: Arc<dyn AuthHeaderProvider>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            headers,
            endpoint: endpoint.into(),
            probe: Arc::new(StatusDeletionProbe),
        }
    }

    /// Replace the deletion probe.
    pub fn with_probe(mut self, probe: Arc<dyn DeletionProbe>) -> Self {
        self.probe = probe;
        self
    }

    fn resolve_url(&self, track_ref: &str) -> String {
        format!(
            "{}/resolve?ref={}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(track_ref)
        )
    }
}

#[async_trait]
impl TrackResolver for HttpTrackResolver {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn resolve(&self, track_ref: &str) -> Result<Resolution> {
        let request = HttpRequest::new(HttpMethod::Get, self.resolve_url(track_ref))
            .header("Accept", "application/json")
            .headers(self.headers.auth_headers().await)
            .timeout(RESOLVE_TIMEOUT);

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!("Resolution request failed: {}", e);
            ResolverError::Network(e.to_string())
        })?;

        if response.is_success() {
            let payload: ResolvedTrackPayload = serde_json::from_slice(&response.body)
                .map_err(|e| {
                    ResolverError::Parse(format!("Malformed resolution payload: {}", e))
                })?;

            debug!(
                segmented = payload.protocol.is_segmented(),
                "Track resolved to playable stream"
            );
            return Ok(Resolution::Playable(PlayableStream {
                playable_url: payload.stream_url,
                is_segmented: payload.protocol.is_segmented(),
            }));
        }

        if self.probe.is_deleted(response.status, &response.body) {
            debug!(status = response.status, "Track classified as deleted");
            return Ok(Resolution::Deleted);
        }

        warn!(status = response.status, "Resolution endpoint failure");
        Err(ResolverError::Endpoint {
            status: response.status,
            message: String::from_utf8_lossy(&response.body).into_owned(),
        }
        .into())
    }
}
