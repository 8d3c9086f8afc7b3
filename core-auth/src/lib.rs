//! # Authentication Support
//!
//! Credential storage and the login-gate contract for the Stream Player
//! Core.
//!
//! ## Overview
//!
//! Authentication itself (the login flow) belongs to the surrounding
//! application. This crate covers what the playback engine needs from it:
//!
//! - [`LoginGate`] - "is the viewer authenticated" predicate; when false
//!   the orchestrator surfaces a gate and never calls the resolver
//! - [`CredentialStore`] - secure persistence for the streaming-service
//!   API credential
//! - [`CredentialHeaderSupplier`] - produces the header set for API-mode
//!   resolution requests; absence of a credential yields an empty set and
//!   steers transport selection toward the widget

pub mod credential_store;
pub mod error;
pub mod gate;
pub mod types;

pub use credential_store::CredentialStore;
pub use error::{AuthError, Result};
pub use gate::{CredentialHeaderSupplier, LoginGate, OpenGate};
pub use types::ApiCredential;
