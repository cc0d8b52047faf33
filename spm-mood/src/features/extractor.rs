//! Whole-signal analysis and feature vector assembly

use super::chroma::chroma_stft;
use super::mel::{mel_db_spectrogram, mfcc};
use super::rhythm::{onset_strength, track_beats, Aggregate, BeatTrack};
use super::spectral::{
    rms, spectral_bandwidth, spectral_centroid, spectral_contrast, spectral_rolloff,
    zero_crossing_rate,
};
use super::stats::{matrix_mean, matrix_std, mean, std};
use super::stft::Spectrogram;
use super::{FeatureError, FeatureVector, FEATURE_COUNT, HOP_LENGTH, N_FFT, N_MELS, N_MFCC};
use crate::audio::AudioSignal;
use std::time::Instant;
use tracing::debug;

const ROLL_PERCENT: f64 = 0.85;
const CONTRAST_FMIN: f64 = 200.0;
const CONTRAST_BANDS: usize = 6;
const CONTRAST_QUANTILE: f64 = 0.02;

/// Frame-level descriptors of one signal
///
/// Computed once per request; both the classifier input and the
/// human-readable descriptors are summarised from it.
#[derive(Debug, Clone)]
pub struct SignalAnalysis {
    pub sample_rate: u32,
    pub rms: Vec<f64>,
    pub zero_crossing_rate: Vec<f64>,
    pub spectral_centroid: Vec<f64>,
    pub spectral_bandwidth: Vec<f64>,
    pub spectral_rolloff: Vec<f64>,
    /// `mfcc[t][k]`
    pub mfcc: Vec<Vec<f64>>,
    /// `chroma[t][pitch_class]`
    pub chroma: Vec<Vec<f64>>,
    /// `contrast[t][band]`
    pub spectral_contrast: Vec<Vec<f64>>,
    /// Band-mean onset envelope
    pub onset_strength: Vec<f64>,
    /// Tempo and beats from the band-median onset envelope
    pub beats: BeatTrack,
}

impl SignalAnalysis {
    /// Run every frame-level analysis over `signal`
    pub fn compute(signal: &AudioSignal) -> Result<Self, FeatureError> {
        if signal.is_empty() {
            return Err(FeatureError::EmptySignal);
        }
        let started = Instant::now();
        let sr = signal.sample_rate;
        let samples = &signal.samples;

        let spec = Spectrogram::compute(samples, sr, N_FFT, HOP_LENGTH);
        let power = spec.power();

        let rms = rms(samples, N_FFT, HOP_LENGTH);
        let zero_crossing_rate = zero_crossing_rate(samples, N_FFT, HOP_LENGTH);
        let spectral_centroid = spectral_centroid(&spec);
        let spectral_bandwidth = spectral_bandwidth(&spec, &spectral_centroid);
        let spectral_rolloff = spectral_rolloff(&spec, ROLL_PERCENT);
        let spectral_contrast =
            spectral_contrast(&spec, CONTRAST_FMIN, CONTRAST_BANDS, CONTRAST_QUANTILE)?;

        let mel_db = mel_db_spectrogram(&power, sr, N_FFT, N_MELS);
        let mfcc = mfcc(&mel_db, N_MFCC);
        let chroma = chroma_stft(&power, sr, N_FFT);

        let onset_strength = onset_strength(&mel_db, N_FFT, HOP_LENGTH, Aggregate::Mean);
        let beat_envelope = onset_strength_median(&mel_db);
        let beats = track_beats(&beat_envelope, sr, HOP_LENGTH);

        debug!(
            frames = spec.n_frames(),
            tempo = beats.tempo,
            beats = beats.beat_frames.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Signal analysis complete"
        );

        Ok(Self {
            sample_rate: sr,
            rms,
            zero_crossing_rate,
            spectral_centroid,
            spectral_bandwidth,
            spectral_rolloff,
            mfcc,
            chroma,
            spectral_contrast,
            onset_strength,
            beats,
        })
    }

    /// Summarise into the classifier's fixed-order vector
    pub fn feature_vector(&self) -> Result<FeatureVector, FeatureError> {
        let onset_std = std(&self.onset_strength);
        let mfcc_mean = |k: usize| mean(self.mfcc.iter().filter_map(|frame| frame.get(k)));

        let values: [f64; FEATURE_COUNT] = [
            self.beats.tempo,
            mean(&self.rms),
            mean(&self.spectral_centroid),
            mean(&self.zero_crossing_rate),
            mean(&self.spectral_rolloff),
            mfcc_mean(1),
            mfcc_mean(2),
            matrix_mean(&self.chroma),
            mean(&self.onset_strength),
            matrix_mean(&self.spectral_contrast),
            onset_std,
            std(&self.rms),
            std(&self.spectral_rolloff),
            matrix_std(&self.chroma),
            onset_std,
        ];

        FeatureVector::new(values)
    }
}

fn onset_strength_median(mel_db: &[Vec<f64>]) -> Vec<f64> {
    onset_strength(mel_db, N_FFT, HOP_LENGTH, Aggregate::Median)
}

/// Signal → [`FeatureVector`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the 15-value feature vector
    ///
    /// Deterministic: identical samples always give a bit-identical vector.
    pub fn extract(&self, signal: &AudioSignal) -> Result<FeatureVector, FeatureError> {
        SignalAnalysis::compute(signal)?.feature_vector()
    }
}
