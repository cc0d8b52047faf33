//! Model artifact loading and label resolution

mod helpers;

use helpers::*;
use serde_json::json;
use spm_mood::features::{FeatureVector, FEATURE_COUNT};
use spm_mood::model::{LabelSource, ModelBundle, ModelLoadError};

fn load(artifact: &serde_json::Value) -> Result<ModelBundle, ModelLoadError> {
    ModelBundle::from_json_str(&artifact.to_string())
}

fn vector_with_rms(rms: f64) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];
    values[1] = rms;
    FeatureVector::new(values).unwrap()
}

#[test]
fn test_missing_bundle_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelBundle::load(&dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(err, ModelLoadError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_load_from_disk_records_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_model(&dir.path().join("model.json"), &loudness_model_json(default_classes()));

    let bundle = ModelBundle::load(&path).unwrap();
    assert_eq!(bundle.metadata().source_path.as_deref(), Some(path.as_path()));
    assert_eq!(bundle.labels(), ["calm", "energetic", "happy", "sad"]);
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = ModelBundle::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ModelLoadError::Parse(_)));
}

#[test]
fn test_classes_win_over_classifier_native_list() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["classifier"]["classes"] = json!(["sad", "happy", "energetic", "calm"]);

    let bundle = load(&artifact).unwrap();
    assert_eq!(bundle.metadata().label_source, LabelSource::Classes);
    assert_eq!(bundle.labels(), ["calm", "energetic", "happy", "sad"]);
    assert_eq!(bundle.predict(&vector_with_rms(0.8)).unwrap().label, "energetic");
}

#[test]
fn test_duplicate_classifier_classes_rejected() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["classifier"]["classes"] = json!(["calm", "calm", "happy", "sad"]);

    match load(&artifact).unwrap_err() {
        ModelLoadError::Labels(message) => assert!(message.contains("calm"), "{}", message),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_labels_must_cover_canonical_moods() {
    let artifact = loudness_model_json(json!(["calm", "energetic", "happy", "angry"]));

    match load(&artifact).unwrap_err() {
        ModelLoadError::MissingMoods { missing, .. } => assert_eq!(missing, ["sad"]),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_extra_labels_allowed() {
    let mut artifact = loudness_model_json(json!(["calm", "energetic", "happy", "sad", "tense"]));
    let mut coef = vec![vec![0.0; FEATURE_COUNT]; 5];
    coef[1][1] = 20.0;
    artifact["classifier"]["coef"] = json!(coef);
    artifact["classifier"]["intercept"] = json!([0.0, -6.0, -10.0, -10.0, -10.0]);

    let bundle = load(&artifact).unwrap();
    let prediction = bundle.predict(&vector_with_rms(0.8)).unwrap();
    assert_eq!(prediction.probabilities.len(), 5);
    assert!(prediction.probabilities.contains_key("tense"));
}

#[test]
fn test_v1_falls_back_to_default_labels() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["schema_version"] = json!(1);
    artifact.as_object_mut().unwrap().remove("classes");

    let bundle = load(&artifact).unwrap();
    assert_eq!(bundle.metadata().label_source, LabelSource::Default);
    assert_eq!(bundle.labels(), ["calm", "energetic", "happy", "sad"]);
}

#[test]
fn test_v1_moods_used_when_classes_absent() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["schema_version"] = json!(1);
    artifact.as_object_mut().unwrap().remove("classes");
    artifact["moods"] = json!(["calm", "energetic", "happy", "sad"]);

    let bundle = load(&artifact).unwrap();
    assert_eq!(bundle.metadata().label_source, LabelSource::Moods);
}

#[test]
fn test_v2_requires_classes() {
    let mut artifact = loudness_model_json(default_classes());
    artifact.as_object_mut().unwrap().remove("classes");

    assert!(matches!(load(&artifact).unwrap_err(), ModelLoadError::Labels(_)));
}

#[test]
fn test_v2_rejects_moods() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["moods"] = json!(["calm", "energetic", "happy", "sad"]);

    assert!(matches!(load(&artifact).unwrap_err(), ModelLoadError::Labels(_)));
}

#[test]
fn test_unsupported_schema_version() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["schema_version"] = json!(3);

    assert!(matches!(load(&artifact).unwrap_err(), ModelLoadError::UnsupportedSchema(3)));
}

#[test]
fn test_wrong_feature_count() {
    let mut artifact = loudness_model_json(default_classes());
    artifact["n_features"] = json!(13);

    assert!(matches!(
        load(&artifact).unwrap_err(),
        ModelLoadError::FeatureCount { expected: 15, found: 13 }
    ));
}

#[test]
fn test_random_forest_artifact() {
    let artifact = json!({
        "schema_version": 2,
        "model_type": "random_forest",
        "n_features": FEATURE_COUNT,
        "classes": ["calm", "energetic", "happy", "sad"],
        "scaler": {
            "mean": vec![0.0; FEATURE_COUNT],
            "scale": vec![1.0; FEATURE_COUNT],
        },
        "classifier": {
            "kind": "random_forest",
            "trees": [
                {
                    "children_left": [1, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [1, -2, -2],
                    "threshold": [0.3, -2.0, -2.0],
                    "value": [[10.0, 10.0, 0.0, 0.0], [10.0, 0.0, 0.0, 0.0], [0.0, 10.0, 0.0, 0.0]],
                },
                {
                    "children_left": [-1],
                    "children_right": [-1],
                    "feature": [-2],
                    "threshold": [-2.0],
                    "value": [[1.0, 1.0, 1.0, 1.0]],
                },
            ],
        },
    });

    let bundle = load(&artifact).unwrap();
    assert_eq!(bundle.metadata().classifier_kind, "random_forest");

    let loud = bundle.predict(&vector_with_rms(0.8)).unwrap();
    assert_eq!(loud.label, "energetic");
    assert!((loud.probabilities["energetic"] - 0.625).abs() < 1e-12);
    assert!((loud.probabilities["calm"] - 0.125).abs() < 1e-12);

    let quiet = bundle.predict(&vector_with_rms(0.1)).unwrap();
    assert_eq!(quiet.label, "calm");
}
