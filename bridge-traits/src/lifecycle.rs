//! Page Lifecycle Observation
//!
//! Notifies the core about page visibility transitions so it can stop
//! progress polling while the page is hidden and resume it on page-show.
//!
//! # Platform Support
//!
//! - **Web**: Page Visibility API + pagehide/pageshow
//! - **iOS/Android**: app foreground/background callbacks
//! - **Desktop**: typically always visible

use async_trait::async_trait;

use crate::error::Result;

/// Page visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVisibility {
    /// Page is visible and interactive.
    Visible,
    /// Page is hidden (backgrounded tab, minimized app).
    Hidden,
    /// Page is being torn down; last chance to persist state.
    Unloading,
}

/// Observer of page lifecycle transitions.
#[async_trait]
pub trait PageLifecycleObserver: Send + Sync {
    /// Current visibility state.
    async fn visibility(&self) -> Result<PageVisibility>;

    /// Subscribe to visibility changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn PageVisibilityStream>>;
}

/// Stream of visibility changes.
#[async_trait]
pub trait PageVisibilityStream: Send {
    /// Next state change, or `None` when the stream is closed.
    async fn next(&mut self) -> Option<PageVisibility>;
}
