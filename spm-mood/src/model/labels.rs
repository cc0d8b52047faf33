//! Label set resolution
//!
//! Schema 1 takes the first non-empty of `classes`, `moods`, the
//! classifier's own class list, and finally a built-in default. Schema 2
//! requires `classes` and checks it against the classifier's output count.
//! Either way the result must contain every canonical mood.

use super::artifact::ModelArtifact;
use super::ModelLoadError;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Moods every model must be able to predict
pub const CANONICAL_MOODS: [&str; 4] = ["calm", "energetic", "happy", "sad"];

/// Where the resolved labels came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    Classes,
    Moods,
    Classifier,
    Default,
}

/// Ordered labels plus their provenance
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabels {
    pub labels: Vec<String>,
    pub source: LabelSource,
}

fn non_empty(list: Option<&[String]>) -> Option<&[String]> {
    list.filter(|l| !l.is_empty())
}

/// Resolve the label set for an artifact whose classifier has `n_outputs`
pub fn resolve_labels(artifact: &ModelArtifact, n_outputs: usize) -> Result<ResolvedLabels, ModelLoadError> {
    let resolved = match artifact.schema_version {
        1 => resolve_legacy(artifact),
        2 => resolve_strict(artifact, n_outputs)?,
        other => return Err(ModelLoadError::UnsupportedSchema(other)),
    };

    check_unique(&resolved.labels)?;
    check_canonical_moods(&resolved.labels)?;
    Ok(resolved)
}

fn resolve_legacy(artifact: &ModelArtifact) -> ResolvedLabels {
    let native = artifact.classifier.classes();

    let (labels, source) = if let Some(classes) = non_empty(artifact.classes.as_deref()) {
        (classes.to_vec(), LabelSource::Classes)
    } else if let Some(moods) = non_empty(artifact.moods.as_deref()) {
        (moods.to_vec(), LabelSource::Moods)
    } else if let Some(classes) = non_empty(native) {
        (classes.to_vec(), LabelSource::Classifier)
    } else {
        warn!(
            labels = ?CANONICAL_MOODS,
            "Model artifact names no labels; falling back to default mood list"
        );
        (
            CANONICAL_MOODS.iter().map(|s| s.to_string()).collect(),
            LabelSource::Default,
        )
    };

    if source != LabelSource::Classifier {
        warn_if_disagrees(&labels, native);
    }
    ResolvedLabels { labels, source }
}

fn resolve_strict(artifact: &ModelArtifact, n_outputs: usize) -> Result<ResolvedLabels, ModelLoadError> {
    if artifact.moods.is_some() {
        return Err(ModelLoadError::Labels(
            "schema 2 artifacts must not carry a `moods` list; use `classes`".to_string(),
        ));
    }
    let Some(classes) = non_empty(artifact.classes.as_deref()) else {
        return Err(ModelLoadError::Labels(
            "schema 2 artifacts require a non-empty `classes` list".to_string(),
        ));
    };
    if classes.len() != n_outputs {
        return Err(ModelLoadError::Labels(format!(
            "`classes` has {} labels but the classifier produces {} probabilities",
            classes.len(),
            n_outputs
        )));
    }

    warn_if_disagrees(classes, artifact.classifier.classes());
    Ok(ResolvedLabels {
        labels: classes.to_vec(),
        source: LabelSource::Classes,
    })
}

fn warn_if_disagrees(labels: &[String], native: Option<&[String]>) {
    if let Some(native) = non_empty(native) {
        if native != labels {
            warn!(
                labels = ?labels,
                classifier_classes = ?native,
                "Artifact labels differ from the classifier's own classes; using artifact labels"
            );
        }
    }
}

pub(crate) fn check_unique(labels: &[String]) -> Result<(), ModelLoadError> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(ModelLoadError::Labels(format!("duplicate label {:?}", label)));
        }
    }
    Ok(())
}

/// Every canonical mood must be present
pub fn check_canonical_moods(labels: &[String]) -> Result<(), ModelLoadError> {
    let missing: Vec<String> = CANONICAL_MOODS
        .iter()
        .filter(|m| !labels.iter().any(|l| l == *m))
        .map(|m| m.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ModelLoadError::MissingMoods {
            labels: labels.to_vec(),
            missing,
        })
    }
}
