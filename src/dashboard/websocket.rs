//! WebSocket Broadcaster
//!
//! Broadcasts board snapshots to all connected WebSocket clients.

use super::types::WsMessage;
use tokio::sync::broadcast;

use crate::view::ViewModel;

/// Channel for broadcasting updates to WebSocket clients
#[derive(Debug, Clone)]
pub struct WebSocketBroadcaster {
    tx: broadcast::Sender<String>,
}

impl WebSocketBroadcaster {
    /// Create a new broadcaster with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive broadcast messages
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Broadcast a message to all connected clients
    pub fn broadcast(&self, msg: &WsMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            // Ignore send errors (no receivers is fine)
            let _ = self.tx.send(json);
        }
    }

    /// Broadcast a finished snapshot
    pub fn broadcast_snapshot(&self, view: &ViewModel) {
        self.broadcast(&WsMessage::Snapshot(view.clone()));
    }

    /// Broadcast heartbeat
    pub fn broadcast_heartbeat(&self) {
        self.broadcast(&WsMessage::Heartbeat(chrono::Utc::now().timestamp_millis()));
    }
}

impl Default for WebSocketBroadcaster {
    fn default() -> Self {
        Self::new(16)
    }
}
