//! Deletion Detection Probes
//!
//! Whether a non-success response means "the track is gone" is partly
//! service-specific: some deployments report deletion purely through the
//! status code, others bury it in a response body field. The probe is a
//! pluggable predicate so hosts can match their service without the
//! connector hard-coding string checks.

use serde_json::Value;

/// Predicate classifying a non-success response as gone-forever.
pub trait DeletionProbe: Send + Sync {
    /// Whether the response indicates the track no longer exists.
    fn is_deleted(&self, status: u16, body: &[u8]) -> bool;
}

/// Default probe: gone means HTTP 404 or 410.
#[derive(Debug, Clone, Default)]
pub struct StatusDeletionProbe;

impl DeletionProbe for StatusDeletionProbe {
    fn is_deleted(&self, status: u16, _body: &[u8]) -> bool {
        status == 404 || status == 410
    }
}

/// Probe that additionally inspects a JSON body field, for services that
/// report deletion with a 2xx-adjacent error envelope or a generic 4xx.
///
/// Matches when the status is a client error and `body[field] == value`.
#[derive(Debug, Clone)]
pub struct JsonFieldProbe {
    field: String,
    value: String,
}

impl JsonFieldProbe {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl DeletionProbe for JsonFieldProbe {
    fn is_deleted(&self, status: u16, body: &[u8]) -> bool {
        if StatusDeletionProbe.is_deleted(status, body) {
            return true;
        }
        if !(400..500).contains(&status) {
            return false;
        }
        serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get(&self.field).and_then(|f| f.as_str().map(String::from)))
            .map(|found| found == self.value)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_probe_matches_gone_codes() {
        let probe = StatusDeletionProbe;
        assert!(probe.is_deleted(404, b""));
        assert!(probe.is_deleted(410, b""));
        assert!(!probe.is_deleted(500, b""));
        assert!(!probe.is_deleted(403, b""));
    }

    #[test]
    fn json_probe_inspects_body() {
        let probe = JsonFieldProbe::new("status", "gone");
        assert!(probe.is_deleted(403, br#"{"status": "gone"}"#));
        assert!(!probe.is_deleted(403, br#"{"status": "blocked"}"#));
        assert!(!probe.is_deleted(403, b"not json"));
        // Server errors are never classified as deletion.
        assert!(!probe.is_deleted(503, br#"{"status": "gone"}"#));
        // Status-code matches still apply.
        assert!(probe.is_deleted(410, b""));
    }
}
