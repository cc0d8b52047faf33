//! Serialized model artifact
//!
//! ```json
//! {
//!   "schema_version": 2,
//!   "model_type": "random_forest",
//!   "n_features": 15,
//!   "feature_names": ["tempo_mean", "..."],
//!   "classes": ["calm", "energetic", "happy", "sad"],
//!   "scaler": { "mean": [...], "scale": [...] },
//!   "classifier": { "kind": "random_forest", "classes": [...], "trees": [...] }
//! }
//! ```
//!
//! Schema 1 is the legacy lenient layout: `classes` is optional and a
//! `moods` list may stand in for it. Schema 2 requires `classes` and rejects
//! `moods`.

use serde::{Deserialize, Serialize};

/// Top-level artifact document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelArtifact {
    pub schema_version: u32,

    /// Informational only (e.g. "random_forest")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,

    pub n_features: usize,

    /// When present, must equal the extractor's feature order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,

    /// Legacy label list (schema 1 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moods: Option<Vec<String>>,

    pub scaler: ScalerParams,

    pub classifier: ClassifierParams,
}

/// Standardisation parameters: `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Classifier parameters, tagged by `kind`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierParams {
    LogisticRegression(LogisticParams),
    RandomForest(ForestParams),
}

impl ClassifierParams {
    /// Class names stored with the classifier itself, if any
    pub fn classes(&self) -> Option<&[String]> {
        match self {
            ClassifierParams::LogisticRegression(p) => p.classes.as_deref(),
            ClassifierParams::RandomForest(p) => p.classes.as_deref(),
        }
    }
}

/// Multinomial logistic regression: softmax(`coef · x + intercept`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogisticParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    /// One row of weights per class
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

/// Random forest of CART trees; probabilities are averaged across trees
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    pub trees: Vec<TreeParams>,
}

/// One tree in flat node-array form
///
/// Node 0 is the root. A node is a leaf when `children_left[i] == -1`.
/// Internal nodes send a sample left when `x[feature[i]] <= threshold[i]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeParams {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights (counts or fractions)
    pub value: Vec<Vec<f64>>,
}
