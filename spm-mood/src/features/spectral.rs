//! Frame-level time and spectral descriptors
//!
//! Time-domain features (RMS, zero-crossing rate) frame the raw signal with
//! the same centred 2048/512 layout as the STFT. Spectral-shape features take
//! the magnitude spectrogram.

use super::stft::{frame_count, Spectrogram};
use super::FeatureError;

const AMIN: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

/// Convert power values to dB (`ref = 1`, `amin = 1e-10`), clipped to
/// `top_db` below the peak of the whole input
pub fn power_to_db(power: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut db: Vec<Vec<f64>> = power
        .iter()
        .map(|row| row.iter().map(|&p| 10.0 * p.max(AMIN).log10()).collect())
        .collect();

    let peak = db
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = peak - TOP_DB;
    for value in db.iter_mut().flatten() {
        if *value < floor {
            *value = floor;
        }
    }
    db
}

/// Root-mean-square energy per centred frame (zero padding)
pub fn rms(samples: &[f32], frame_length: usize, hop: usize) -> Vec<f64> {
    let pad = frame_length / 2;
    (0..frame_count(samples.len(), hop))
        .map(|t| {
            let start = (t * hop) as isize - pad as isize;
            let sum_sq: f64 = (0..frame_length)
                .filter_map(|j| {
                    let idx = start + j as isize;
                    (idx >= 0 && (idx as usize) < samples.len()).then(|| samples[idx as usize] as f64)
                })
                .map(|s| s * s)
                .sum();
            (sum_sq / frame_length as f64).sqrt()
        })
        .collect()
}

/// Zero-crossing rate per centred frame (edge padding)
///
/// Samples with magnitude at or below 1e-10 count as zero, and zero counts as
/// positive. The first sample of a frame never counts as a crossing.
pub fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop: usize) -> Vec<f64> {
    const THRESHOLD: f64 = 1e-10;

    if samples.is_empty() {
        return vec![0.0];
    }

    let pad = frame_length / 2;
    let last = samples.len() - 1;
    let negative = |idx: isize| -> bool {
        let clamped = idx.clamp(0, last as isize) as usize;
        (samples[clamped] as f64) < -THRESHOLD
    };

    (0..frame_count(samples.len(), hop))
        .map(|t| {
            let start = (t * hop) as isize - pad as isize;
            let crossings = (1..frame_length)
                .filter(|&j| {
                    let idx = start + j as isize;
                    negative(idx) != negative(idx - 1)
                })
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

/// Normalise a magnitude frame to unit sum; silent frames stay zero
fn unit_sum(frame: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = frame.iter().sum();
    if total <= f64::MIN_POSITIVE {
        return None;
    }
    Some(frame.iter().map(|m| m / total).collect())
}

/// Magnitude-weighted mean frequency per frame (0 for silent frames)
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f64> {
    let freqs = spec.frequencies();
    spec.frames
        .iter()
        .map(|frame| match unit_sum(frame) {
            Some(weights) => weights.iter().zip(&freqs).map(|(w, f)| w * f).sum(),
            None => 0.0,
        })
        .collect()
}

/// Magnitude-weighted frequency spread around the centroid (p = 2)
pub fn spectral_bandwidth(spec: &Spectrogram, centroid: &[f64]) -> Vec<f64> {
    let freqs = spec.frequencies();
    spec.frames
        .iter()
        .zip(centroid)
        .map(|(frame, &c)| match unit_sum(frame) {
            Some(weights) => weights
                .iter()
                .zip(&freqs)
                .map(|(w, f)| w * (f - c) * (f - c))
                .sum::<f64>()
                .sqrt(),
            None => 0.0,
        })
        .collect()
}

/// Lowest frequency below which `roll_percent` of the frame's magnitude lies
pub fn spectral_rolloff(spec: &Spectrogram, roll_percent: f64) -> Vec<f64> {
    let freqs = spec.frequencies();
    spec.frames
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().sum();
            let threshold = roll_percent * total;
            let mut cumulative = 0.0;
            for (m, f) in frame.iter().zip(&freqs) {
                cumulative += m;
                if cumulative >= threshold {
                    return *f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

/// Octave-band spectral contrast, `n_bands + 1` rows per frame
///
/// Bands are `[0, fmin]`, `[fmin, 2 fmin]`, ... with the last band extended to
/// Nyquist. Each band's peak and valley are the means of the top and bottom
/// `quantile` of its sorted magnitudes; contrast is `peak_db - valley_db`.
/// Returned frame-major (`contrast[t][band]`).
pub fn spectral_contrast(
    spec: &Spectrogram,
    fmin: f64,
    n_bands: usize,
    quantile: f64,
) -> Result<Vec<Vec<f64>>, FeatureError> {
    let freqs = spec.frequencies();
    let nyquist = spec.sample_rate as f64 / 2.0;

    let mut edges = vec![0.0; n_bands + 2];
    for (k, edge) in edges.iter_mut().enumerate().skip(1) {
        *edge = fmin * 2f64.powi(k as i32 - 1);
    }
    if edges[..edges.len() - 1].iter().any(|&e| e >= nyquist) {
        return Err(FeatureError::InvalidParameter(format!(
            "contrast bands from {} Hz exceed Nyquist {} Hz",
            fmin, nyquist
        )));
    }

    // Bin ranges and quantile counts are the same for every frame
    let mut bands = Vec::with_capacity(n_bands + 1);
    for k in 0..=n_bands {
        let (low, high) = (edges[k], edges[k + 1]);
        let in_band: Vec<usize> = (0..freqs.len())
            .filter(|&i| freqs[i] >= low && freqs[i] <= high)
            .collect();
        let (Some(&first), Some(&last)) = (in_band.first(), in_band.last()) else {
            return Err(FeatureError::InvalidParameter(format!(
                "contrast band {} ({}-{} Hz) contains no bins",
                k, low, high
            )));
        };

        let mut start = first;
        let mut end = last + 1;
        if k > 0 && start > 0 {
            start -= 1;
        }
        if k == n_bands {
            end = freqs.len();
        }
        let members = end - start;
        let take_end = if k < n_bands { end - 1 } else { end };
        let count = ((quantile * members as f64).round_ties_even() as usize).max(1);
        bands.push((start, take_end, count));
    }

    let mut peaks = Vec::with_capacity(spec.n_frames());
    let mut valleys = Vec::with_capacity(spec.n_frames());
    let mut sorted = Vec::new();
    for frame in &spec.frames {
        let mut peak_row = Vec::with_capacity(bands.len());
        let mut valley_row = Vec::with_capacity(bands.len());
        for &(start, end, count) in &bands {
            sorted.clear();
            sorted.extend_from_slice(&frame[start..end]);
            sorted.sort_by(|a, b| a.total_cmp(b));
            let n = count.min(sorted.len()).max(1);
            valley_row.push(sorted[..n].iter().sum::<f64>() / n as f64);
            peak_row.push(sorted[sorted.len() - n..].iter().sum::<f64>() / n as f64);
        }
        peaks.push(peak_row);
        valleys.push(valley_row);
    }

    let peak_db = power_to_db(&peaks);
    let valley_db = power_to_db(&valleys);
    Ok(peak_db
        .iter()
        .zip(&valley_db)
        .map(|(p, v)| p.iter().zip(v).map(|(p, v)| p - v).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: u32, seconds: f64, amp: f64) -> Vec<f32> {
        let n = (sr as f64 * seconds) as usize;
        (0..n)
            .map(|i| (amp * (2.0 * std::f64::consts::PI * freq * i as f64 / sr as f64).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_power_to_db_clips_to_top_db() {
        let db = power_to_db(&[vec![1.0, 1e-3, 0.0]]);
        assert!((db[0][0] - 0.0).abs() < 1e-12);
        assert!((db[0][1] + 30.0).abs() < 1e-9);
        // 0 → amin → -100 dB, clipped to -80
        assert!((db[0][2] + 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let samples = vec![0.5f32; 22_050];
        let values = rms(&samples, 2048, 512);
        assert_eq!(values.len(), frame_count(samples.len(), 512));
        // Interior frames are fully covered
        assert!((values[10] - 0.5).abs() < 1e-6);
        // The first frame is half zero padding
        assert!((values[0] - (0.25f64 * 1024.0 / 2048.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_zcr_of_sine() {
        // 1000 Hz sine crosses zero 2000 times per second
        let samples = sine(1000.0, 22_050, 1.0, 0.5);
        let values = zero_crossing_rate(&samples, 2048, 512);
        let interior = values[10];
        let expected = 2000.0 / 22_050.0;
        assert!((interior - expected).abs() < 0.005, "zcr {}", interior);
    }

    #[test]
    fn test_zcr_of_silence_is_zero() {
        let values = zero_crossing_rate(&vec![0.0; 4096], 2048, 512);
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_centroid_tracks_frequency() {
        let sr = 22_050;
        let low = Spectrogram::compute(&sine(500.0, sr, 1.0, 0.5), sr, 2048, 512);
        let high = Spectrogram::compute(&sine(4000.0, sr, 1.0, 0.5), sr, 2048, 512);
        let c_low = spectral_centroid(&low)[20];
        let c_high = spectral_centroid(&high)[20];
        assert!((c_low - 500.0).abs() < 50.0, "centroid {}", c_low);
        assert!((c_high - 4000.0).abs() < 100.0, "centroid {}", c_high);

        let bw = spectral_bandwidth(&low, &spectral_centroid(&low));
        assert!(bw[20] > 0.0 && bw[20] < 200.0, "bandwidth {}", bw[20]);
    }

    #[test]
    fn test_silent_frames_are_zero() {
        let spec = Spectrogram::compute(&vec![0.0; 4096], 22_050, 2048, 512);
        let centroid = spectral_centroid(&spec);
        assert!(centroid.iter().all(|&c| c == 0.0));
        assert!(spectral_bandwidth(&spec, &centroid).iter().all(|&b| b == 0.0));
        assert!(spectral_rolloff(&spec, 0.85).iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_rolloff_above_tone() {
        let sr = 22_050;
        let spec = Spectrogram::compute(&sine(2000.0, sr, 1.0, 0.5), sr, 2048, 512);
        let rolloff = spectral_rolloff(&spec, 0.85)[20];
        assert!(rolloff >= 2000.0 && rolloff < 2100.0, "rolloff {}", rolloff);
    }

    #[test]
    fn test_contrast_shape_and_tone_vs_noise() {
        let sr = 22_050;
        let spec = Spectrogram::compute(&sine(1000.0, sr, 1.0, 0.5), sr, 2048, 512);
        let contrast = spectral_contrast(&spec, 200.0, 6, 0.02).unwrap();
        assert_eq!(contrast.len(), spec.n_frames());
        assert!(contrast.iter().all(|row| row.len() == 7));
        // The 800-1600 Hz band holds the tone and has strong contrast
        assert!(contrast[20][3] > 20.0, "contrast {}", contrast[20][3]);
    }

    #[test]
    fn test_contrast_rejects_low_sample_rate() {
        let spec = Spectrogram::compute(&vec![0.0; 4096], 8_000, 2048, 512);
        assert!(matches!(
            spectral_contrast(&spec, 200.0, 6, 0.02),
            Err(FeatureError::InvalidParameter(_))
        ));
    }
}
