//! HTTP endpoints next to the WebSocket.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Live transport connections, joined or not
    pub connections: usize,
    /// Rooms with at least one joined connection
    pub rooms: usize,
}

/// GET /healthz
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.router.len().await,
        rooms: state.directory.room_count().await,
    })
}
