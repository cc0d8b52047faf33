//! Feature extraction
//!
//! Turns a canonical-rate [`AudioSignal`](crate::audio::AudioSignal) into the
//! fixed 15-value [`FeatureVector`] the classifier was trained on.
//!
//! # Feature order
//!
//! | idx | name                     | source                               |
//! |-----|--------------------------|--------------------------------------|
//! | 0   | `tempo_mean`             | beat tracker tempo (BPM)             |
//! | 1   | `energy_rms_mean`        | RMS per frame                        |
//! | 2   | `spectral_centroid_mean` | magnitude-weighted mean frequency    |
//! | 3   | `zero_crossing_rate_mean`| zero crossings per sample            |
//! | 4   | `spectral_rolloff_mean`  | 85% rolloff frequency                |
//! | 5   | `mfcc_1_mean`            | MFCC coefficient 1                   |
//! | 6   | `mfcc_2_mean`            | MFCC coefficient 2                   |
//! | 7   | `chroma_mean`            | chromagram, all bins                 |
//! | 8   | `onset_strength_mean`    | onset envelope                       |
//! | 9   | `spectral_contrast_mean` | octave-band contrast, all bands      |
//! | 10  | `tempo_std`              | onset envelope std (tempo variability proxy) |
//! | 11  | `energy_rms_std`         | RMS per frame                        |
//! | 12  | `spectral_rolloff_std`   | 85% rolloff frequency                |
//! | 13  | `chroma_std`             | chromagram, all bins                 |
//! | 14  | `onset_strength_std`     | onset envelope                       |

pub mod chroma;
pub mod extractor;
pub mod mel;
pub mod rhythm;
pub mod spectral;
pub mod stats;
pub mod stft;

pub use extractor::{FeatureExtractor, SignalAnalysis};

use serde::Serialize;
use thiserror::Error;

/// STFT frame length in samples
pub const N_FFT: usize = 2048;
/// STFT hop in samples
pub const HOP_LENGTH: usize = 512;
/// Mel bands
pub const N_MELS: usize = 128;
/// Cepstral coefficients computed per frame
pub const N_MFCC: usize = 13;
/// Number of values in a [`FeatureVector`]
pub const FEATURE_COUNT: usize = 15;

/// Canonical feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "tempo_mean",
    "energy_rms_mean",
    "spectral_centroid_mean",
    "zero_crossing_rate_mean",
    "spectral_rolloff_mean",
    "mfcc_1_mean",
    "mfcc_2_mean",
    "chroma_mean",
    "onset_strength_mean",
    "spectral_contrast_mean",
    "tempo_std",
    "energy_rms_std",
    "spectral_rolloff_std",
    "chroma_std",
    "onset_strength_std",
];

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Signal has no samples
    #[error("Cannot extract features from an empty signal")]
    EmptySignal,

    /// Analysis parameters do not fit the signal
    #[error("Invalid analysis parameter: {0}")]
    InvalidParameter(String),

    /// A finished feature is NaN or infinite
    #[error("Feature {name} is not finite ({value})")]
    NonFinite { name: &'static str, value: f64 },
}

/// Fixed-order, fixed-length feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap raw values, rejecting NaN and infinities
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, FeatureError> {
        if let Some((i, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(FeatureError::NonFinite {
                name: FEATURE_NAMES[i],
                value,
            });
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// `(name, value)` pairs in vector order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite() {
        let mut values = [0.0; FEATURE_COUNT];
        values[9] = f64::NAN;
        match FeatureVector::new(values) {
            Err(FeatureError::NonFinite { name, .. }) => assert_eq!(name, "spectral_contrast_mean"),
            other => panic!("unexpected {:?}", other),
        }

        values[9] = f64::INFINITY;
        assert!(FeatureVector::new(values).is_err());
    }

    #[test]
    fn test_named_order() {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = 120.0;
        values[14] = 1.5;
        let vector = FeatureVector::new(values).unwrap();
        let named: Vec<_> = vector.named().collect();
        assert_eq!(named.len(), FEATURE_COUNT);
        assert_eq!(named[0], ("tempo_mean", 120.0));
        assert_eq!(named[10].0, "tempo_std");
        assert_eq!(named[14], ("onset_strength_std", 1.5));
    }

    #[test]
    fn test_serializes_as_array() {
        let vector = FeatureVector::new([1.0; FEATURE_COUNT]).unwrap();
        let json = serde_json::to_value(vector).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(FEATURE_COUNT));
    }
}
