//! Mood model: scaler + classifier + label set
//!
//! The model ships as a versioned JSON artifact (see [`artifact`]). It is
//! loaded and validated once at startup into an immutable [`ModelBundle`]
//! that request handlers share read-only.

pub mod artifact;
pub mod bundle;
pub mod classifier;
pub mod labels;
pub mod scaler;

pub use artifact::ModelArtifact;
pub use bundle::{ModelBundle, ModelMetadata, Prediction};
pub use classifier::Classifier;
pub use labels::{LabelSource, ResolvedLabels, CANONICAL_MOODS};
pub use scaler::StandardScaler;

use thiserror::Error;

/// Errors loading or validating a model artifact (fatal at startup)
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported schema_version {0} (supported: 1, 2)")]
    UnsupportedSchema(u32),

    #[error("Model expects {found} features, extractor produces {expected}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Feature names do not match the extractor: {0}")]
    FeatureNames(String),

    #[error("Invalid scaler: {0}")]
    Scaler(String),

    #[error("Invalid classifier: {0}")]
    Classifier(String),

    #[error("Invalid label set: {0}")]
    Labels(String),

    #[error("Model labels {labels:?} do not cover required moods {missing:?}")]
    MissingMoods {
        labels: Vec<String>,
        missing: Vec<String>,
    },
}

/// Errors during inference
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Feature {index} is not finite")]
    NonFiniteInput { index: usize },

    #[error("Classifier returned {probabilities} probabilities but {labels} labels are known")]
    LabelMismatch { labels: usize, probabilities: usize },

    #[error("Classifier produced an invalid distribution: {0}")]
    InvalidOutput(String),
}
