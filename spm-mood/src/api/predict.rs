//! Prediction endpoint
//!
//! POST /predict accepts a multipart upload with one `file` field and returns
//! the predicted mood, per-label probabilities and descriptive audio features.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::pipeline::PredictionResult;
use crate::AppState;

/// Multipart field carrying the audio file
pub const FILE_FIELD: &str = "file";

/// Extensions accepted regardless of the declared content type
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac", "m4a"];

/// Upload pulled out of the multipart body
struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Whether an upload looks like audio by content type or filename
pub fn is_supported_upload(content_type: Option<&str>, filename: Option<&str>) -> bool {
    let by_type = content_type
        .map(|ct| ct.trim().to_ascii_lowercase())
        .is_some_and(|ct| ct.starts_with("audio/") || ct == "application/octet-stream");

    let by_extension = filename.map(str::to_ascii_lowercase).is_some_and(|name| {
        AUDIO_EXTENSIONS
            .iter()
            .any(|ext| name.strip_suffix(ext).is_some_and(|stem| stem.ends_with('.')))
    });

    by_type || by_extension
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD)))
}

async fn run_prediction(state: AppState, multipart: Multipart) -> ApiResult<PredictionResult> {
    let upload = read_upload(multipart).await?;

    if !is_supported_upload(upload.content_type.as_deref(), upload.filename.as_deref()) {
        return Err(ApiError::BadRequest("Unsupported audio format".to_string()));
    }

    info!(
        filename = upload.filename.as_deref().unwrap_or("<unnamed>"),
        content_type = upload.content_type.as_deref().unwrap_or("<none>"),
        bytes = upload.bytes.len(),
        "Received prediction upload"
    );

    let predictor = state.predictor.clone();
    let result = tokio::task::spawn_blocking(move || {
        predictor.predict_bytes(&upload.bytes, upload.filename.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))??;

    Ok(result)
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<PredictionResult>> {
    match run_prediction(state, multipart).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            if err.status().is_server_error() {
                error!(code = err.code(), error = %err, "Prediction failed");
            } else {
                warn!(code = err.code(), error = %err, "Prediction rejected");
            }
            Err(err)
        }
    }
}

pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}
