//! # Core Runtime
//!
//! Shared runtime infrastructure for the Stream Player Core: the event
//! bus, the configuration builder, and logging setup.
//!
//! ## Modules
//!
//! - [`events`] - Typed broadcast event bus connecting the orchestrator,
//!   adapters, UI sync layer, and external observers
//! - [`config`] - Fail-fast configuration builder collecting bridge
//!   implementations and engine tunables
//! - [`logging`] - `tracing-subscriber` setup for hosts that want the core
//!   to own log output
//! - [`error`] - Runtime error types

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, PlayerTuning};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream, NoticeEvent, PlaybackEvent, Transport};
