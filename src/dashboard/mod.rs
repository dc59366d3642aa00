//! Dashboard Module
//!
//! Serves the latest board snapshot over HTTP and pushes every new one to
//! WebSocket clients. Only compiled when the `dashboard` feature is enabled.

mod api;
mod types;
mod websocket;

pub use api::create_router;
pub use types::*;
pub use websocket::WebSocketBroadcaster;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::publish::Publisher;
use crate::view::ViewModel;

/// In-memory state for the dashboard API
#[derive(Debug, Default)]
pub struct DashboardMemory {
    /// Latest complete snapshot
    latest: RwLock<Option<Arc<ViewModel>>>,
    /// Data feed health snapshot for /api/health
    pub health: RwLock<HealthResponse>,
}

impl DashboardMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<Arc<ViewModel>> {
        self.latest.read().await.clone()
    }

    /// Replace the snapshot and its health summary
    pub async fn store(&self, view: Arc<ViewModel>) {
        let health = HealthResponse::from_view(&view);
        *self.latest.write().await = Some(view);
        *self.health.write().await = health;
    }
}

/// Publisher feeding the dashboard API
#[derive(Debug, Clone)]
pub struct DashboardPublisher {
    memory: Arc<DashboardMemory>,
    broadcaster: WebSocketBroadcaster,
}

impl DashboardPublisher {
    pub fn new(memory: Arc<DashboardMemory>, broadcaster: WebSocketBroadcaster) -> Self {
        Self {
            memory,
            broadcaster,
        }
    }
}

#[async_trait]
impl Publisher for DashboardPublisher {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn publish(&self, view: Arc<ViewModel>) {
        // Stored first: a client connecting mid-publish reads it or receives the broadcast
        self.memory.store(Arc::clone(&view)).await;
        self.broadcaster.broadcast_snapshot(&view);
    }
}

/// Serve the dashboard API until `cancel` fires
pub async fn serve(
    bind_addr: &str,
    memory: Arc<DashboardMemory>,
    broadcaster: WebSocketBroadcaster,
    cancel: CancellationToken,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind dashboard on {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "🖥️ Dashboard API listening");

    let heartbeat = broadcaster.clone();
    let heartbeat_cancel = cancel.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(15));
        loop {
            tokio::select! {
                _ = heartbeat_cancel.cancelled() => break,
                _ = ticker.tick() => heartbeat.broadcast_heartbeat(),
            }
        }
    });

    axum::serve(listener, create_router(memory, broadcaster))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("Dashboard server failed")
}
