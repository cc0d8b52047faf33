//! Decode → features → inference → assembly
//!
//! [`MoodPredictor`] is synchronous and blocking; the HTTP layer runs it on a
//! blocking worker. It holds only shared read-only state, so one instance is
//! safe to use from any number of requests at once.

pub mod assembler;

pub use assembler::{assemble, describe, AudioDescriptors, PredictionResult};

use crate::audio::{AudioDecoder, DecodeError};
use crate::features::{FeatureError, FeatureVector, SignalAnalysis};
use crate::model::{ModelBundle, ModelError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Any failure along the pipeline
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// Staging the upload to disk failed
    #[error("Failed to stage audio upload: {0}")]
    Staging(#[source] std::io::Error),
}

/// Prediction plus the vector the classifier saw
#[derive(Debug, Clone)]
pub struct DetailedPrediction {
    pub result: PredictionResult,
    pub features: FeatureVector,
}

/// End-to-end mood predictor
#[derive(Debug, Clone)]
pub struct MoodPredictor {
    bundle: Arc<ModelBundle>,
    decoder: AudioDecoder,
}

impl MoodPredictor {
    pub fn new(bundle: Arc<ModelBundle>, decoder: AudioDecoder) -> Self {
        Self { bundle, decoder }
    }

    pub fn bundle(&self) -> &Arc<ModelBundle> {
        &self.bundle
    }

    /// Predict the mood of an audio file on disk
    pub fn predict_file(&self, path: &Path) -> Result<PredictionResult, PredictError> {
        self.analyze_file(path).map(|detailed| detailed.result)
    }

    /// Like [`predict_file`](Self::predict_file), also returning the feature vector
    pub fn analyze_file(&self, path: &Path) -> Result<DetailedPrediction, PredictError> {
        let started = Instant::now();

        let signal = self.decoder.decode(path)?;
        info!(
            path = %path.display(),
            duration_seconds = signal.duration_seconds(),
            source_sample_rate = signal.source_sample_rate,
            source_channels = signal.source_channels,
            "Decoded audio"
        );

        let analysis = SignalAnalysis::compute(&signal)?;
        let features = analysis.feature_vector()?;
        debug!(features = ?features.values(), "Extracted feature vector");

        let prediction = self.bundle.predict(&features)?;
        let result = assemble(&signal, &analysis, prediction);

        info!(
            mood = %result.mood,
            confidence = result.probabilities.get(&result.mood).copied().unwrap_or(0.0),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Predicted mood"
        );

        Ok(DetailedPrediction { result, features })
    }

    /// Predict from uploaded bytes
    ///
    /// The bytes are staged into a uniquely named temporary file (keeping the
    /// original extension as a decoder hint) that is deleted when this call
    /// returns, whatever the outcome.
    pub fn predict_bytes(&self, bytes: &[u8], filename: Option<&str>) -> Result<PredictionResult, PredictError> {
        let suffix = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();

        let mut staged = tempfile::Builder::new()
            .prefix("spm-upload-")
            .suffix(&suffix)
            .tempfile()
            .map_err(PredictError::Staging)?;
        staged.write_all(bytes).map_err(PredictError::Staging)?;
        staged.flush().map_err(PredictError::Staging)?;

        debug!(path = %staged.path().display(), bytes = bytes.len(), "Staged upload");
        self.predict_file(staged.path())
    }
}
