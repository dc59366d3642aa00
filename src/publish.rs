//! Hand-off of finished view models to render layers

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::view::ViewModel;

/// Consumer of complete snapshots
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Receive the snapshot of one finished cycle
    async fn publish(&self, view: Arc<ViewModel>);
}

/// Latest-value channel for in-process renderers
#[derive(Debug, Clone)]
pub struct WatchPublisher {
    tx: watch::Sender<Option<Arc<ViewModel>>>,
}

impl WatchPublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Receiver that always holds the newest snapshot (None before the first cycle)
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ViewModel>>> {
        self.tx.subscribe()
    }
}

impl Default for WatchPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for WatchPublisher {
    fn name(&self) -> &'static str {
        "watch"
    }

    async fn publish(&self, view: Arc<ViewModel>) {
        // send_replace succeeds with no receivers
        self.tx.send_replace(Some(view));
    }
}

/// Writes a text rendering of every snapshot to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, view: Arc<ViewModel>) {
        tracing::info!(
            cycle = view.cycle,
            fetched_at = %view.fetched_at,
            "📊 Board refreshed\n{}",
            view.render_text()
        );
    }
}
