//! Dashboard API Types
//!
//! DTOs for HTTP/WebSocket communication with the browser page.

use serde::{Deserialize, Serialize};

use crate::view::ViewModel;

// ─────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────

/// Refresh loop health, derived from the latest snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthResponse {
    /// Cycle number of the latest snapshot (0 before the first cycle)
    pub cycle: u64,
    pub fetched_at: i64,
    pub metrics: usize,
    pub stale_metrics: usize,
    pub missing_metrics: usize,
    pub headlines: usize,
    pub updated_at: i64,
}

impl HealthResponse {
    pub fn from_view(view: &ViewModel) -> Self {
        Self {
            cycle: view.cycle,
            fetched_at: view.fetched_at.timestamp_millis(),
            metrics: view.metrics.len(),
            stale_metrics: view.stale_count(),
            missing_metrics: view.missing_count(),
            headlines: view.news.len(),
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Message Types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Latest snapshot (sent on connect and after every cycle)
    Snapshot(ViewModel),
    /// Heartbeat
    Heartbeat(i64),
}

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
