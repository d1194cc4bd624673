//! HTTP API endpoints.
//!
//! Read-only views used by lobby screens and load balancers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// HTTP routes, to be merged with the WebSocket route
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/rooms/{code}", get(get_room))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Summary of one room.
///
/// GET /api/rooms/{code}
pub async fn get_room(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.get_room(&code).await {
        Some(room) => Json(room.lock().await.summary()).into_response(),
        None => (StatusCode::NOT_FOUND, "Room not found").into_response(),
    }
}
