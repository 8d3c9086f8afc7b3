//! Secure Credential Storage
//!
//! Persists the streaming-service API credential through the platform's
//! [`SecureStore`] bridge. Token values are never logged; failed
//! operations are reported without exposing sensitive data.

use crate::error::{AuthError, Result};
use crate::types::ApiCredential;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key for the API credential.
const CREDENTIAL_KEY: &str = "player.api_credential";

/// Secure storage for the API credential.
///
/// # Example
///
/// ```no_run
/// use core_auth::{ApiCredential, CredentialStore};
/// use std::sync::Arc;
/// # use bridge_traits::storage::SecureStore;
/// # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
/// let store = CredentialStore::new(secure_store);
///
/// let credential = ApiCredential::new("token-value", chrono::Utc::now());
/// store.store(&credential).await?;
///
/// let loaded = store.retrieve().await?;
/// assert!(loaded.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    secure_store: Arc<dyn SecureStore>,
}

impl CredentialStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self { secure_store }
    }

    /// Persist a credential, replacing any previous one.
    pub async fn store(&self, credential: &ApiCredential) -> Result<()> {
        let serialized = serde_json::to_vec(credential)
            .map_err(|e| AuthError::Storage(format!("Serialization failed: {}", e)))?;

        self.secure_store
            .set_secret(CREDENTIAL_KEY, &serialized)
            .await?;

        debug!("Stored API credential");
        Ok(())
    }

    /// Retrieve the stored credential, if any.
    ///
    /// A malformed stored value is treated as absent after a warning; it
    /// never aborts player startup.
    pub async fn retrieve(&self) -> Result<Option<ApiCredential>> {
        let Some(raw) = self.secure_store.get_secret(CREDENTIAL_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<ApiCredential>(&raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                warn!("Stored credential is malformed, discarding: {}", e);
                self.secure_store.delete_secret(CREDENTIAL_KEY).await.ok();
                Ok(None)
            }
        }
    }

    /// Delete the stored credential.
    pub async fn delete(&self) -> Result<()> {
        self.secure_store.delete_secret(CREDENTIAL_KEY).await?;
        debug!("Deleted API credential");
        Ok(())
    }

    /// Whether a credential is stored, without deserializing it.
    pub async fn exists(&self) -> Result<bool> {
        Ok(self.secure_store.has_secret(CREDENTIAL_KEY).await?)
    }
}
