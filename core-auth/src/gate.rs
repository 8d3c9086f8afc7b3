//! Login Gate and Header Supplier
//!
//! The login-gate decision itself belongs to the surrounding application;
//! the core only consumes the predicate. When the viewer is not
//! authenticated, the orchestrator surfaces a gate notice and never calls
//! the resolver.
//!
//! The header supplier turns the stored credential into the header set
//! attached to API-mode resolution requests. Absence of a credential
//! yields an empty header set; requests are never blocked by absence, it
//! only steers transport selection.

use crate::credential_store::CredentialStore;
use async_trait::async_trait;
use bridge_traits::http::AuthHeaderProvider;
use bridge_traits::time::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Predicate deciding whether the viewer may start playback.
#[async_trait]
pub trait LoginGate: Send + Sync {
    /// Whether the viewer is authenticated with the surrounding
    /// application.
    async fn is_authenticated(&self) -> bool;
}

/// Gate that always admits the viewer. For hosts without a login wall and
/// for tests.
#[derive(Debug, Clone, Default)]
pub struct OpenGate;

#[async_trait]
impl LoginGate for OpenGate {
    async fn is_authenticated(&self) -> bool {
        true
    }
}

/// Header supplier backed by the [`CredentialStore`].
#[derive(Clone)]
pub struct CredentialHeaderSupplier {
    credentials: CredentialStore,
    clock: Arc<dyn Clock>,
}

impl CredentialHeaderSupplier {
    pub fn new(credentials: CredentialStore, clock: Arc<dyn Clock>) -> Self {
        Self { credentials, clock }
    }
}

#[async_trait]
impl AuthHeaderProvider for CredentialHeaderSupplier {
    async fn auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();

        match self.credentials.retrieve().await {
            Ok(Some(credential)) if credential.is_valid_at(self.clock.now()) => {
                headers.insert(
                    "Authorization".to_string(),
                    format!("OAuth {}", credential.token()),
                );
            }
            Ok(_) => {
                debug!("No valid credential stored, supplying empty header set");
            }
            Err(e) => {
                debug!("Credential lookup failed, supplying empty header set: {}", e);
            }
        }

        headers
    }

    async fn has_credential(&self) -> bool {
        match self.credentials.retrieve().await {
            Ok(Some(credential)) => credential.is_valid_at(self.clock.now()),
            _ => false,
        }
    }
}
