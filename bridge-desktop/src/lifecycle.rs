//! Page Lifecycle Observer for Desktop
//!
//! Desktop windows have no meaningful hide/unload cycle for audio: the
//! page is "visible" until the process exits. The observer still exists
//! so the core's ticker wiring is identical across hosts, and tests can
//! drive transitions through [`ManualLifecycleObserver`].

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    lifecycle::{PageLifecycleObserver, PageVisibility, PageVisibilityStream},
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Always-visible observer for desktop hosts.
#[derive(Debug, Clone, Default)]
pub struct DesktopLifecycleObserver;

struct EmptyStream;

#[async_trait]
impl PageVisibilityStream for EmptyStream {
    async fn next(&mut self) -> Option<PageVisibility> {
        // Never yields; desktop pages do not hide.
        std::future::pending().await
    }
}

#[async_trait]
impl PageLifecycleObserver for DesktopLifecycleObserver {
    async fn visibility(&self) -> Result<PageVisibility> {
        Ok(PageVisibility::Visible)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn PageVisibilityStream>> {
        Ok(Box::new(EmptyStream))
    }
}

/// Observer whose transitions are driven by the embedder. Useful for
/// tests and for shells that map window minimize/restore onto page
/// visibility.
#[derive(Clone)]
pub struct ManualLifecycleObserver {
    sender: Arc<broadcast::Sender<PageVisibility>>,
}

impl ManualLifecycleObserver {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Push a visibility transition to all subscribers.
    pub fn transition(&self, state: PageVisibility) {
        self.sender.send(state).ok();
    }
}

impl Default for ManualLifecycleObserver {
    fn default() -> Self {
        Self::new()
    }
}

struct BroadcastStream(broadcast::Receiver<PageVisibility>);

#[async_trait]
impl PageVisibilityStream for BroadcastStream {
    async fn next(&mut self) -> Option<PageVisibility> {
        loop {
            match self.0.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
impl PageLifecycleObserver for ManualLifecycleObserver {
    async fn visibility(&self) -> Result<PageVisibility> {
        Ok(PageVisibility::Visible)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn PageVisibilityStream>> {
        Ok(Box::new(BroadcastStream(self.sender.subscribe())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_observer_delivers_transitions() {
        let observer = ManualLifecycleObserver::new();
        let mut stream = observer.subscribe_changes().await.unwrap();

        observer.transition(PageVisibility::Hidden);
        assert_eq!(stream.next().await, Some(PageVisibility::Hidden));

        observer.transition(PageVisibility::Visible);
        assert_eq!(stream.next().await, Some(PageVisibility::Visible));
    }
}
