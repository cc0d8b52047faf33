//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
///
/// The model is loaded before the listener starts, so a responding process
/// is always ready to predict.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "running" })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
