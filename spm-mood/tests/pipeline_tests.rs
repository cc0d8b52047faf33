//! End-to-end pipeline tests: decode → features → inference → assembly

mod helpers;

use helpers::*;
use spm_mood::audio::{AudioDecoder, CANONICAL_SAMPLE_RATE};
use spm_mood::features::{FeatureExtractor, FEATURE_COUNT, FEATURE_NAMES};

#[test]
fn test_decoding_twice_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tone_wav(
        &dir.path().join("pulse.wav"),
        &ToneConfig {
            pulse_bpm: Some(120.0),
            ..ToneConfig::default()
        },
    );

    let decoder = AudioDecoder::new();
    let extractor = FeatureExtractor::new();
    let first = extractor.extract(&decoder.decode(&path).unwrap()).unwrap();
    let second = extractor.extract(&decoder.decode(&path).unwrap()).unwrap();

    let first_bits: Vec<u64> = first.values().iter().map(|v| v.to_bits()).collect();
    let second_bits: Vec<u64> = second.values().iter().map(|v| v.to_bits()).collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn test_stereo_matches_mono() {
    let dir = tempfile::tempdir().unwrap();
    let mono = write_tone_wav(&dir.path().join("mono.wav"), &ToneConfig::default());
    let stereo = write_tone_wav(
        &dir.path().join("stereo.wav"),
        &ToneConfig {
            channels: 2,
            ..ToneConfig::default()
        },
    );

    let decoder = AudioDecoder::new();
    let extractor = FeatureExtractor::new();
    let mono_signal = decoder.decode(&mono).unwrap();
    let stereo_signal = decoder.decode(&stereo).unwrap();
    assert_eq!(stereo_signal.source_channels, 2);
    assert_eq!(mono_signal.samples.len(), stereo_signal.samples.len());

    let a = extractor.extract(&mono_signal).unwrap();
    let b = extractor.extract(&stereo_signal).unwrap();
    assert_eq!(a.values().len(), FEATURE_COUNT);
    for (x, y) in a.values().iter().zip(b.values()) {
        assert!((x - y).abs() < 1e-9, "{} vs {}", x, y);
    }
}

#[test]
fn test_resampled_to_canonical_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tone_wav(
        &dir.path().join("cd.wav"),
        &ToneConfig {
            sample_rate: 44_100,
            duration_seconds: 2.0,
            ..ToneConfig::default()
        },
    );

    let signal = AudioDecoder::new().decode(&path).unwrap();
    assert_eq!(signal.sample_rate, CANONICAL_SAMPLE_RATE);
    assert_eq!(signal.source_sample_rate, 44_100);
    assert!((signal.duration_seconds() - 2.0).abs() < 0.01);
}

#[test]
fn test_feature_vector_shape_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tone_wav(
        &dir.path().join("pulse.wav"),
        &ToneConfig {
            pulse_bpm: Some(120.0),
            duration_seconds: 6.0,
            ..ToneConfig::default()
        },
    );

    let features = FeatureExtractor::new()
        .extract(&AudioDecoder::new().decode(&path).unwrap())
        .unwrap();

    let named: Vec<(&str, f64)> = features.named().collect();
    assert_eq!(named.len(), FEATURE_COUNT);
    for ((name, value), expected) in named.iter().zip(FEATURE_NAMES) {
        assert_eq!(*name, expected);
        assert!(value.is_finite());
    }

    let tempo = features.values()[0];
    assert!((90.0..=150.0).contains(&tempo), "tempo {}", tempo);
    // Onset std doubles as the tempo-variability proxy
    assert_eq!(features.values()[10], features.values()[14]);
    assert!(features.values()[1] > 0.0);
}

#[test]
fn test_predict_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tone_wav(
        &dir.path().join("quiet.wav"),
        &ToneConfig {
            amplitude: 0.05,
            ..ToneConfig::default()
        },
    );

    let detailed = test_predictor().analyze_file(&path).unwrap();
    assert_eq!(detailed.result.mood, "calm");
    assert_eq!(detailed.result.probabilities.len(), 4);
    let total: f64 = detailed.result.probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-3);
    assert_eq!(detailed.result.audio_features.energy, detailed.features.values()[1]);
}

#[test]
fn test_predict_bytes_leaves_no_staged_file() {
    let bytes = wav_bytes(&ToneConfig::default());
    let predictor = test_predictor();

    let before = staged_uploads();
    predictor.predict_bytes(&bytes, Some("Track.WAV")).unwrap();
    assert!(predictor.predict_bytes(b"", Some("empty.mp3")).is_err());
    assert_eq!(staged_uploads(), before);
}

fn staged_uploads() -> usize {
    std::fs::read_dir(std::env::temp_dir())
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with("spm-upload-"))
                .count()
        })
        .unwrap_or(0)
}
