//! spm-mood library interface
//!
//! Song mood classification: decode → feature extraction → inference →
//! result assembly, plus the HTTP API around it.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::Router;
use chrono::{DateTime, Utc};
use model::ModelBundle;
use pipeline::MoodPredictor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Application state shared across handlers
///
/// Built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    /// Loaded model, shared read-only
    pub bundle: Arc<ModelBundle>,
    /// Pipeline bound to `bundle`
    pub predictor: Arc<MoodPredictor>,
    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(predictor: MoodPredictor, max_upload_bytes: usize) -> Self {
        Self {
            bundle: predictor.bundle().clone(),
            predictor: Arc::new(predictor),
            max_upload_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .merge(api::model_routes())
        .merge(api::predict_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
}
