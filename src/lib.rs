//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the
//! individual workspace crates (e.g., `core-player`, `provider-tracks`,
//! `bridge-desktop`). Host applications can depend on `spc-workspace` and
//! enable the documented features without wiring each crate individually.
