//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux), so the playback engine runs and is testable
//! outside a browser page:
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value store
//! - `SecureStore` using the `keyring` crate
//! - `PageLifecycleObserver` as always-visible (plus a manually driven
//!   variant for tests/shells)
//!
//! The playback surfaces themselves (`MediaElementHost`, `WidgetHost`)
//! are page concerns and stay with the embedding host.
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let settings = SqliteSettingsStore::new(SqliteSettingsStore::default_path())
//!         .await
//!         .expect("settings store");
//!     // Hand both to core_runtime::config::CoreConfig::builder()
//! }
//! ```

mod http;
mod lifecycle;
mod settings;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;
pub use lifecycle::{DesktopLifecycleObserver, ManualLifecycleObserver};
pub use settings::SqliteSettingsStore;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
