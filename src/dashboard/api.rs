//! Dashboard HTTP API
//!
//! REST endpoints and WebSocket feed for the board page.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use super::{DashboardMemory, WebSocketBroadcaster};

type AppState = (Arc<DashboardMemory>, WebSocketBroadcaster);

/// Create the API router with all endpoints
pub fn create_router(memory: Arc<DashboardMemory>, broadcaster: WebSocketBroadcaster) -> Router {
    Router::new()
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/health", get(get_health))
        .route("/ws", get(websocket_handler))
        .with_state((memory, broadcaster))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/snapshot - Latest complete view model
async fn get_snapshot(State((memory, _)): State<AppState>) -> impl IntoResponse {
    match memory.latest().await {
        Some(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(view.as_ref().clone())),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error("no refresh cycle has completed yet")),
        ),
    }
}

/// GET /api/health - Refresh loop health
async fn get_health(State((memory, _)): State<AppState>) -> impl IntoResponse {
    let health = memory.health.read().await.clone();
    Json(ApiResponse::success(health))
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Handler
// ─────────────────────────────────────────────────────────────────

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State((memory, broadcaster)): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, memory, broadcaster))
}

/// Push the stored snapshot, then every new one, until the client leaves
async fn handle_websocket(
    socket: WebSocket,
    memory: Arc<DashboardMemory>,
    broadcaster: WebSocketBroadcaster,
) {
    use futures_util::{SinkExt, StreamExt};

    // Subscribed before reading `latest`, so a snapshot stored in between still arrives on `rx`
    let mut rx = broadcaster.subscribe();
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("🖥️ Board client connected");

    if let Some(view) = memory.latest().await {
        let msg = WsMessage::Snapshot(view.as_ref().clone());
        if let Ok(json) = serde_json::to_string(&msg) {
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }
    }

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                // Only the newest snapshot matters
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Board client lagging, skipped snapshots");
                }
                Err(RecvError::Closed) => break,
            },
            // Pings are answered by axum; other client input is ignored
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("🖥️ Board client disconnected");
}
