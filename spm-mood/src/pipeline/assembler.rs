//! Final result assembly
//!
//! Combines the classifier's output with human-readable descriptors of the
//! track. The descriptors are presentation only and never reach the
//! classifier.

use crate::audio::AudioSignal;
use crate::features::stats::{mean, std};
use crate::features::{SignalAnalysis, HOP_LENGTH};
use crate::model::Prediction;
use serde::Serialize;
use std::collections::BTreeMap;

/// Human-readable descriptors of a track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioDescriptors {
    /// Beat tracker tempo, BPM
    pub tempo: f64,
    /// Std of inter-beat intervals (seconds) × 60
    pub tempo_variance: f64,
    /// Mean RMS
    pub energy: f64,
    /// Std of RMS
    pub energy_variance: f64,
    /// Mean spectral centroid, Hz
    pub spectral_centroid: f64,
    /// Mean spectral bandwidth, Hz
    pub spectral_bandwidth: f64,
    pub zero_crossing_rate: f64,
    /// Mean centroid relative to Nyquist, in [0, 1]
    pub valence: f64,
    /// Seconds
    pub duration: f64,
}

/// Response for one analysed track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub mood: String,
    pub probabilities: BTreeMap<String, f64>,
    pub audio_features: AudioDescriptors,
}

/// Build the descriptors from the frame-level analysis
pub fn describe(signal: &AudioSignal, analysis: &SignalAnalysis) -> AudioDescriptors {
    let beat_times = analysis.beats.beat_times(analysis.sample_rate, HOP_LENGTH);
    let tempo_variance = if beat_times.len() > 1 {
        let intervals: Vec<f64> = beat_times.windows(2).map(|w| w[1] - w[0]).collect();
        std(&intervals) * 60.0
    } else {
        0.0
    };

    let centroid = mean(&analysis.spectral_centroid);
    let nyquist = analysis.sample_rate as f64 / 2.0;

    AudioDescriptors {
        tempo: analysis.beats.tempo,
        tempo_variance,
        energy: mean(&analysis.rms),
        energy_variance: std(&analysis.rms),
        spectral_centroid: centroid,
        spectral_bandwidth: mean(&analysis.spectral_bandwidth),
        zero_crossing_rate: mean(&analysis.zero_crossing_rate),
        valence: if nyquist > 0.0 { centroid / nyquist } else { 0.0 },
        duration: signal.duration_seconds(),
    }
}

/// Combine the classifier output with the track descriptors
pub fn assemble(signal: &AudioSignal, analysis: &SignalAnalysis, prediction: Prediction) -> PredictionResult {
    PredictionResult {
        mood: prediction.label,
        probabilities: prediction.probabilities,
        audio_features: describe(signal, analysis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CANONICAL_SAMPLE_RATE;
    use crate::features::rhythm::BeatTrack;

    fn analysis(beat_frames: Vec<usize>) -> SignalAnalysis {
        SignalAnalysis {
            sample_rate: CANONICAL_SAMPLE_RATE,
            rms: vec![0.1, 0.3],
            zero_crossing_rate: vec![0.05, 0.15],
            spectral_centroid: vec![1000.0, 3000.0],
            spectral_bandwidth: vec![500.0, 700.0],
            spectral_rolloff: vec![0.0, 0.0],
            mfcc: vec![],
            chroma: vec![],
            spectral_contrast: vec![],
            onset_strength: vec![],
            beats: BeatTrack {
                tempo: 120.0,
                beat_frames,
            },
        }
    }

    fn signal() -> AudioSignal {
        AudioSignal {
            samples: vec![0.0; 44_100],
            sample_rate: CANONICAL_SAMPLE_RATE,
            source_sample_rate: 44_100,
            source_channels: 2,
        }
    }

    #[test]
    fn test_descriptors() {
        let d = describe(&signal(), &analysis(vec![0, 43, 86]));
        assert_eq!(d.tempo, 120.0);
        assert_eq!(d.tempo_variance, 0.0);
        assert!((d.energy - 0.2).abs() < 1e-12);
        assert!((d.energy_variance - 0.1).abs() < 1e-12);
        assert_eq!(d.spectral_centroid, 2000.0);
        assert_eq!(d.spectral_bandwidth, 600.0);
        assert!((d.zero_crossing_rate - 0.1).abs() < 1e-12);
        assert!((d.valence - 2000.0 / 11_025.0).abs() < 1e-12);
        assert!((d.duration - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tempo_variance_from_uneven_beats() {
        // Intervals of 10 and 30 frames
        let d = describe(&signal(), &analysis(vec![0, 10, 40]));
        let hop_seconds = HOP_LENGTH as f64 / CANONICAL_SAMPLE_RATE as f64;
        let expected = 10.0 * hop_seconds * 60.0;
        assert!((d.tempo_variance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fewer_than_two_beats() {
        assert_eq!(describe(&signal(), &analysis(vec![])).tempo_variance, 0.0);
        assert_eq!(describe(&signal(), &analysis(vec![5])).tempo_variance, 0.0);
    }

    #[test]
    fn test_assemble_keeps_prediction() {
        let mut probabilities = BTreeMap::new();
        probabilities.insert("calm".to_string(), 0.7);
        probabilities.insert("sad".to_string(), 0.3);
        let result = assemble(
            &signal(),
            &analysis(vec![]),
            Prediction {
                label: "calm".to_string(),
                probabilities: probabilities.clone(),
            },
        );
        assert_eq!(result.mood, "calm");
        assert_eq!(result.probabilities, probabilities);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["audio_features"]["valence"].is_number());
    }
}
