//! Onset strength, tempo estimation and beat tracking
//!
//! Onset strength is the positive first difference of the dB mel
//! spectrogram, aggregated across bands. Tempo comes from an autocorrelation
//! tempogram weighted by a log-normal prior around 120 BPM. Beats are placed by
//! dynamic programming over the onset envelope at that tempo.

use super::stats::{median, sample_std};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

/// How per-band onset differences are combined into one value per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Median,
}

/// Prior centre of the tempo estimate, in BPM
pub const START_BPM: f64 = 120.0;
/// Autocorrelation window length, in seconds
const AC_SIZE_SECONDS: f64 = 8.0;
/// Tempi at or above this are never chosen
const MAX_TEMPO: f64 = 320.0;
/// Penalty weight on deviations from the target beat period
const TIGHTNESS: f64 = 100.0;

/// Onset strength envelope, one value per mel frame
///
/// The envelope is centred: the first `1 + n_fft / (2 * hop)` frames are zero
/// so peaks line up with the frames that contain the onset.
pub fn onset_strength(mel_db: &[Vec<f64>], n_fft: usize, hop: usize, aggregate: Aggregate) -> Vec<f64> {
    let n_frames = mel_db.len();
    let lead = 1 + n_fft / (2 * hop);

    let mut envelope = vec![0.0; n_frames];
    let mut diffs = Vec::new();
    for t in lead..n_frames {
        // Padded position t maps to the difference between frames t-lead+1 and t-lead
        let (prev, cur) = (&mel_db[t - lead], &mel_db[t - lead + 1]);
        diffs.clear();
        diffs.extend(cur.iter().zip(prev).map(|(c, p)| (c - p).max(0.0)));
        envelope[t] = match aggregate {
            Aggregate::Mean => diffs.iter().sum::<f64>() / diffs.len().max(1) as f64,
            Aggregate::Median => median(&diffs),
        };
    }
    envelope
}

/// Frames spanned by the tempogram's autocorrelation window
pub fn tempogram_window(sample_rate: u32, hop: usize) -> usize {
    ((AC_SIZE_SECONDS * sample_rate as f64) as usize) / hop
}

/// Time-averaged autocorrelation tempogram of the onset envelope
///
/// Each frame is a Hann-windowed slice of the envelope (padded at both ends
/// with a linear ramp to zero), autocorrelated and scaled to unit peak.
/// Returns one value per lag in `0..win_length`.
pub fn mean_tempogram(onset: &[f64], win_length: usize) -> Vec<f64> {
    let n = onset.len();
    if n == 0 || win_length == 0 {
        return vec![0.0; win_length];
    }

    let pad = win_length / 2;
    let first = onset[0];
    let last = onset[n - 1];
    let mut padded = Vec::with_capacity(n + 2 * pad);
    padded.extend((0..pad).map(|i| first * i as f64 / pad as f64));
    padded.extend_from_slice(onset);
    padded.extend((0..pad).map(|j| last * (pad - 1 - j) as f64 / pad as f64));

    let window = super::stft::hann_window(win_length);
    let fft_len = (2 * win_length - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);
    let mut buffer = vec![Complex::default(); fft_len];

    let mut sum = vec![0.0; win_length];
    for t in 0..n {
        buffer.iter_mut().for_each(|c| *c = Complex::default());
        for (j, w) in window.iter().enumerate() {
            let value = padded.get(t + j).copied().unwrap_or(0.0);
            buffer[j] = Complex::new(value * w, 0.0);
        }
        forward.process(&mut buffer);
        buffer.iter_mut().for_each(|c| *c = Complex::new(c.norm_sqr(), 0.0));
        inverse.process(&mut buffer);

        let scale = 1.0 / fft_len as f64;
        let peak = buffer[..win_length]
            .iter()
            .fold(0.0f64, |m, c| m.max((c.re * scale).abs()));
        if peak > f64::MIN_POSITIVE {
            for (s, c) in sum.iter_mut().zip(&buffer[..win_length]) {
                *s += c.re * scale / peak;
            }
        }
    }

    sum.iter_mut().for_each(|s| *s /= n as f64);
    sum
}

/// BPM represented by each autocorrelation lag (lag 0 is infinite)
pub fn tempo_frequencies(n_bins: usize, sample_rate: u32, hop: usize) -> Vec<f64> {
    (0..n_bins)
        .map(|lag| {
            if lag == 0 {
                f64::INFINITY
            } else {
                60.0 * sample_rate as f64 / (hop as f64 * lag as f64)
            }
        })
        .collect()
}

/// Global tempo estimate in BPM
pub fn estimate_tempo(onset: &[f64], sample_rate: u32, hop: usize) -> f64 {
    let win_length = tempogram_window(sample_rate, hop);
    let tempogram = mean_tempogram(onset, win_length);
    let bpms = tempo_frequencies(win_length, sample_rate, hop);

    let max_idx = bpms.iter().position(|&b| b < MAX_TEMPO).unwrap_or(bpms.len());
    let mut best: Option<(usize, f64)> = None;
    for (lag, (&strength, &bpm)) in tempogram.iter().zip(&bpms).enumerate().skip(max_idx) {
        let log_prior = -0.5 * (bpm.log2() - START_BPM.log2()).powi(2);
        let score = (1e6 * strength).ln_1p() + log_prior;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((lag, score));
        }
    }

    best.map(|(lag, _)| bpms[lag]).unwrap_or(START_BPM)
}

/// Beat tracking result
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTrack {
    /// Tempo in BPM (0 when the signal has no onsets)
    pub tempo: f64,
    /// Beat positions as frame indices, ascending
    pub beat_frames: Vec<usize>,
}

impl BeatTrack {
    /// Beat times in seconds
    pub fn beat_times(&self, sample_rate: u32, hop: usize) -> Vec<f64> {
        self.beat_frames
            .iter()
            .map(|&f| (f * hop) as f64 / sample_rate as f64)
            .collect()
    }
}

/// Estimate tempo and track beats over an onset envelope
pub fn track_beats(onset: &[f64], sample_rate: u32, hop: usize) -> BeatTrack {
    if !onset.iter().any(|&v| v != 0.0) {
        return BeatTrack {
            tempo: 0.0,
            beat_frames: Vec::new(),
        };
    }

    let tempo = estimate_tempo(onset, sample_rate, hop);
    let frame_rate = sample_rate as f64 / hop as f64;
    let period = ((60.0 * frame_rate / tempo).round_ties_even() as usize).max(1);

    let normalised = normalize_onsets(onset);
    let local_score = local_score(&normalised, period);
    let (backlink, cumulative) = dynamic_program(&local_score, period);

    let mut beats = vec![last_beat(&cumulative)];
    while let Some(prev) = backlink[beats[beats.len() - 1]] {
        beats.push(prev);
    }
    beats.reverse();

    let beat_frames = trim_beats(&local_score, &beats);
    debug!(tempo, period, beats = beat_frames.len(), "Beat tracking complete");

    BeatTrack { tempo, beat_frames }
}

fn normalize_onsets(onset: &[f64]) -> Vec<f64> {
    let norm = sample_std(onset);
    if norm > 0.0 {
        onset.iter().map(|v| v / norm).collect()
    } else {
        onset.to_vec()
    }
}

/// Smooth the envelope with a Gaussian of width `period / 32` ('same' length)
fn local_score(onset: &[f64], period: usize) -> Vec<f64> {
    let p = period as isize;
    let window: Vec<f64> = (-p..=p)
        .map(|k| (-0.5 * (k as f64 * 32.0 / period as f64).powi(2)).exp())
        .collect();

    let n = onset.len() as isize;
    (0..n)
        .map(|i| {
            (-p..=p)
                .filter_map(|k| {
                    let idx = i + k;
                    (0..n)
                        .contains(&idx)
                        .then(|| onset[idx as usize] * window[(k + p) as usize])
                })
                .sum()
        })
        .collect()
}

/// Best-predecessor search over `[-2 period, -period / 2]`
fn dynamic_program(local_score: &[f64], period: usize) -> (Vec<Option<usize>>, Vec<f64>) {
    let p = period as isize;
    let min_offset = -2 * p;
    let max_offset = -((period as f64 / 2.0).round_ties_even() as isize);
    let offsets: Vec<isize> = (min_offset..=max_offset).collect();
    let transition: Vec<f64> = offsets
        .iter()
        .map(|&o| -TIGHTNESS * ((-o as f64) / period as f64).ln().powi(2))
        .collect();

    let max_score = local_score.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut backlink = vec![None; local_score.len()];
    let mut cumulative = vec![0.0; local_score.len()];
    let mut first_beat = true;

    for (i, &score) in local_score.iter().enumerate() {
        let mut best_k = 0;
        let mut best = f64::NEG_INFINITY;
        for (k, (&offset, &weight)) in offsets.iter().zip(&transition).enumerate() {
            let prev = i as isize + offset;
            // Predecessors before the start contribute no accumulated score
            let candidate = if prev >= 0 {
                weight + cumulative[prev as usize]
            } else {
                weight
            };
            if candidate > best {
                best = candidate;
                best_k = k;
            }
        }

        cumulative[i] = score + best;

        if first_beat && score < 0.01 * max_score {
            backlink[i] = None;
        } else {
            let prev = i as isize + offsets[best_k];
            backlink[i] = (prev >= 0).then_some(prev as usize);
            first_beat = false;
        }
    }

    (backlink, cumulative)
}

/// Last local maximum of the cumulative score above half its median peak
fn last_beat(cumulative: &[f64]) -> usize {
    let n = cumulative.len();
    let is_peak = |i: usize| -> bool {
        let left = cumulative[i.saturating_sub(1)];
        let right = cumulative[(i + 1).min(n - 1)];
        cumulative[i] > left && cumulative[i] >= right
    };

    let peaks: Vec<f64> = (0..n).filter(|&i| is_peak(i)).map(|i| cumulative[i]).collect();
    let med = median(&peaks);

    (0..n)
        .rev()
        .find(|&i| {
            let value = if is_peak(i) { cumulative[i] * 2.0 } else { 0.0 };
            value > med
        })
        .unwrap_or(n.saturating_sub(1))
}

/// Symmetric 5-point Hann kernel used to smooth beat strengths
const TRIM_KERNEL: [f64; 5] = [0.0, 0.5, 1.0, 0.5, 0.0];

/// Centred ("same" mode) convolution of beat strengths with [`TRIM_KERNEL`]
fn smooth_beat_strengths(strengths: &[f64]) -> Vec<f64> {
    let n = strengths.len() as isize;
    (0..n)
        .map(|i| {
            TRIM_KERNEL
                .iter()
                .enumerate()
                .filter_map(|(k, h)| {
                    let idx = i + 2 - k as isize;
                    (0..n).contains(&idx).then(|| strengths[idx as usize] * h)
                })
                .sum()
        })
        .collect()
}

/// Drop weak leading and trailing beats
///
/// The beat-synchronous local score is smoothed with a symmetric 5-point
/// Hann kernel; beats are kept from the first to (but excluding) the last
/// position whose smoothed score exceeds half its RMS.
fn trim_beats(local_score: &[f64], beats: &[usize]) -> Vec<usize> {
    let strengths: Vec<f64> = beats.iter().map(|&b| local_score[b]).collect();
    let smooth = smooth_beat_strengths(&strengths);

    if smooth.is_empty() {
        return Vec::new();
    }
    let rms = (smooth.iter().map(|s| s * s).sum::<f64>() / smooth.len() as f64).sqrt();
    let threshold = 0.5 * rms;

    let first = smooth.iter().position(|&s| s > threshold);
    let last = smooth.iter().rposition(|&s| s > threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..last].to_vec(),
        _ => Vec::new(),
    }
}
