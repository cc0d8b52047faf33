//! Loaded, validated model

use super::artifact::ModelArtifact;
use super::classifier::Classifier;
use super::labels::{check_unique, resolve_labels, LabelSource};
use super::scaler::StandardScaler;
use super::{ModelError, ModelLoadError};
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Descriptive information about the loaded model
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub schema_version: u32,
    pub model_type: String,
    pub classifier_kind: &'static str,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub label_source: LabelSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

/// Classifier output for one vector
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label with the highest probability
    pub label: String,
    /// Probability per label
    pub probabilities: BTreeMap<String, f64>,
}

/// Immutable scaler + classifier + labels
#[derive(Debug)]
pub struct ModelBundle {
    metadata: ModelMetadata,
    scaler: StandardScaler,
    classifier: Classifier,
    native_classes: Option<Vec<String>>,
}

impl ModelBundle {
    /// Load and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut bundle = Self::from_json_str(&content)?;
        bundle.metadata.source_path = Some(path.to_path_buf());

        info!(
            path = %path.display(),
            classifier = bundle.metadata.classifier_kind,
            schema_version = bundle.metadata.schema_version,
            classes = ?bundle.metadata.classes,
            label_source = ?bundle.metadata.label_source,
            "Model bundle loaded"
        );
        Ok(bundle)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        if !matches!(artifact.schema_version, 1 | 2) {
            return Err(ModelLoadError::UnsupportedSchema(artifact.schema_version));
        }
        if artifact.n_features != FEATURE_COUNT {
            return Err(ModelLoadError::FeatureCount {
                expected: FEATURE_COUNT,
                found: artifact.n_features,
            });
        }
        if let Some(names) = &artifact.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
                return Err(ModelLoadError::FeatureNames(format!(
                    "got {:?}, expected {:?}",
                    names, FEATURE_NAMES
                )));
            }
        }

        let scaler = StandardScaler::from_params(&artifact.scaler)?;
        let classifier = Classifier::from_params(&artifact.classifier)?;
        let resolved = resolve_labels(&artifact, classifier.n_classes())?;
        // Classifier classes can stand in for the labels at inference
        if let Some(native) = artifact.classifier.classes() {
            check_unique(native)?;
        }

        if resolved.labels.len() != classifier.n_classes() {
            warn!(
                labels = resolved.labels.len(),
                outputs = classifier.n_classes(),
                "Label count differs from classifier outputs; classifier classes will be used at inference"
            );
        }

        let metadata = ModelMetadata {
            schema_version: artifact.schema_version,
            model_type: artifact
                .model_type
                .clone()
                .unwrap_or_else(|| classifier.kind().to_string()),
            classifier_kind: classifier.kind(),
            n_features: FEATURE_COUNT,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classes: resolved.labels,
            label_source: resolved.source,
            source_path: None,
            loaded_at: Utc::now(),
        };

        Ok(Self {
            metadata,
            scaler,
            classifier,
            native_classes: artifact.classifier.classes().map(<[String]>::to_vec),
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Resolved labels, in classifier output order
    pub fn labels(&self) -> &[String] {
        &self.metadata.classes
    }

    /// Scale, classify and label one feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let scaled = self.scaler.transform(features)?;
        let probabilities = self.classifier.predict_proba(&scaled);

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::InvalidOutput(format!("{:?}", probabilities)));
        }

        let labels = self.aligned_labels(probabilities.len())?;

        // First maximum wins on ties
        let best = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > probabilities[best] { i } else { best });

        Ok(Prediction {
            label: labels[best].clone(),
            probabilities: labels.iter().cloned().zip(probabilities).collect(),
        })
    }

    /// Labels matching the probability vector's length
    fn aligned_labels(&self, n: usize) -> Result<&[String], ModelError> {
        let labels = self.labels();
        if labels.len() == n {
            return Ok(labels);
        }
        match &self.native_classes {
            Some(native) if native.len() == n => {
                warn!(
                    labels = labels.len(),
                    probabilities = n,
                    "Rebuilding labels from classifier classes"
                );
                Ok(native)
            }
            _ => Err(ModelError::LabelMismatch {
                labels: labels.len(),
                probabilities: n,
            }),
        }
    }
}
