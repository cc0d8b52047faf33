//! Model metadata endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::model::ModelMetadata;
use crate::AppState;

/// GET /model response
#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    #[serde(flatten)]
    pub model: ModelMetadata,
    pub service_version: &'static str,
    pub build: &'static str,
    pub built_at: &'static str,
    pub uptime_seconds: u64,
}

/// GET /model
///
/// Describes the loaded model: schema version, classifier kind, feature
/// order, resolved classes and where they came from.
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(ModelInfoResponse {
        model: state.bundle.metadata().clone(),
        service_version: env!("CARGO_PKG_VERSION"),
        build: env!("SPM_GIT_HASH"),
        built_at: env!("SPM_BUILD_TIMESTAMP"),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
    })
}

pub fn model_routes() -> Router<AppState> {
    Router::new().route("/model", get(model_info))
}
