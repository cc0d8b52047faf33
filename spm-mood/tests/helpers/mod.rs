//! Test Helper Utilities
//!
//! Shared fixtures for spm-mood integration tests: synthetic WAV files, a
//! small logistic model keyed on loudness, and multipart request bodies.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use spm_mood::audio::AudioDecoder;
use spm_mood::features::FEATURE_COUNT;
use spm_mood::model::ModelBundle;
use spm_mood::pipeline::MoodPredictor;
use spm_mood::AppState;

pub const BOUNDARY: &str = "spm-test-boundary";

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct ToneConfig {
    pub frequency: f32,
    pub amplitude: f32,
    pub duration_seconds: f32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Beats per minute of 100 ms tone bursts; `None` for a steady tone
    pub pulse_bpm: Option<f32>,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            amplitude: 0.5,
            duration_seconds: 3.0,
            sample_rate: 22_050,
            channels: 1,
            pulse_bpm: None,
        }
    }
}

/// Write a 16-bit PCM WAV described by `config`
pub fn write_tone_wav(path: &Path, config: &ToneConfig) -> PathBuf {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    let total = (config.duration_seconds * config.sample_rate as f32) as usize;
    let sr = config.sample_rate as f32;

    for i in 0..total {
        let t = i as f32 / sr;
        let gate = match config.pulse_bpm {
            Some(bpm) => {
                let period = 60.0 / bpm;
                if t % period < 0.1 { 1.0 } else { 0.0 }
            }
            None => 1.0,
        };
        let value = config.amplitude * gate * (2.0 * std::f32::consts::PI * config.frequency * t).sin();
        let sample = (value * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample).expect("Failed to write sample");
        }
    }

    writer.finalize().expect("Failed to finalize WAV");
    path.to_path_buf()
}

/// Read a file written by [`write_tone_wav`]
pub fn wav_bytes(config: &ToneConfig) -> Vec<u8> {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = write_tone_wav(&dir.path().join("tone.wav"), config);
    std::fs::read(path).expect("Failed to read WAV")
}

/// Logistic model driven by mean RMS (feature 1)
///
/// energetic: `20 * (rms - 0.3)`, calm: `-20 * (rms - 0.3)`, happy and sad
/// sit at a constant -10. Loud tones come out energetic, quiet ones calm.
pub fn loudness_model_json(classes: serde_json::Value) -> serde_json::Value {
    let mut coef = vec![vec![0.0; FEATURE_COUNT]; 4];
    coef[0][1] = -20.0;
    coef[1][1] = 20.0;

    json!({
        "schema_version": 2,
        "model_type": "logistic_regression",
        "n_features": FEATURE_COUNT,
        "classes": classes,
        "scaler": {
            "mean": vec![0.0; FEATURE_COUNT],
            "scale": vec![1.0; FEATURE_COUNT],
        },
        "classifier": {
            "kind": "logistic_regression",
            "coef": coef,
            "intercept": [6.0, -6.0, -10.0, -10.0],
        },
    })
}

pub fn default_classes() -> serde_json::Value {
    json!(["calm", "energetic", "happy", "sad"])
}

pub fn write_model(path: &Path, artifact: &serde_json::Value) -> PathBuf {
    std::fs::write(path, serde_json::to_vec_pretty(artifact).expect("serialize model"))
        .expect("Failed to write model");
    path.to_path_buf()
}

pub fn loudness_bundle() -> Arc<ModelBundle> {
    let json = loudness_model_json(default_classes()).to_string();
    Arc::new(ModelBundle::from_json_str(&json).expect("fixture model must load"))
}

/// Predictor with no transcoder, so decoding failures surface directly
pub fn test_predictor() -> MoodPredictor {
    MoodPredictor::new(loudness_bundle(), AudioDecoder::new())
}

pub fn test_app_with_limit(max_upload_bytes: usize) -> axum::Router {
    spm_mood::build_router(AppState::new(test_predictor(), max_upload_bytes))
}

pub fn test_app() -> axum::Router {
    test_app_with_limit(100 * 1024 * 1024)
}

/// Build a multipart/form-data body with one part
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
