//! # Track Resolution Provider
//!
//! HTTP connector for the streaming service's resolution endpoint.
//!
//! ## Overview
//!
//! Resolution turns an opaque track reference into a playable stream
//! descriptor. The connector performs one request per call and classifies
//! the outcome:
//!
//! - 2xx → [`Resolution::Playable`](bridge_traits::resolver::Resolution)
//!   with the stream URL and delivery protocol
//! - deletion probe match (default: 404/410) →
//!   [`Resolution::Deleted`](bridge_traits::resolver::Resolution),
//!   terminal and never retried
//! - anything else → transient error, left to the caller to retry or
//!   fall back
//!
//! Auth headers come from the `core-auth` header supplier; an absent
//! credential simply yields an unauthenticated request.

pub mod connector;
pub mod error;
pub mod probe;
pub mod types;

pub use connector::HttpTrackResolver;
pub use error::{ResolverError, Result};
pub use probe::{DeletionProbe, JsonFieldProbe, StatusDeletionProbe};
pub use types::{ResolvedTrackPayload, StreamProtocol};
