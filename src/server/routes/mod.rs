//! HTTP route handlers
//!
//! - push_routes: VAPID key, subscription registration and fan-out
//! - this module: index and health check

pub mod push_routes;

use axum::{extract::State, Json};
use serde::Serialize;

use super::ServerAppState;

/// Response for the index endpoint
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: Option<String>,
}

/// Index endpoint - returns the configured greeting
pub async fn index_handler(State(state): State<ServerAppState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        message: state.greeting.as_deref().map(str::to_string),
    })
}

/// Health check endpoint
pub async fn health_handler() -> &'static str {
    "OK"
}
