//! Mel spectrogram and MFCC
//!
//! Slaney mel scale (linear below 1 kHz, logarithmic above) with
//! area-normalised triangular filters. The dB mel spectrogram produced here
//! feeds both the cepstral coefficients and the onset-strength envelope.

use super::spectral::power_to_db;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Hz to mel (Slaney)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Mel to Hz (Slaney)
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filterbank, `n_mels` rows of `n_fft / 2 + 1` weights
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let fmax = sample_rate as f64 / 2.0;
    let mel_max = hz_to_mel(fmax);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();
    let fft_freqs = super::stft::fft_frequencies(sample_rate, n_fft);

    (0..n_mels)
        .map(|i| {
            let lower_width = mel_f[i + 1] - mel_f[i];
            let upper_width = mel_f[i + 2] - mel_f[i + 1];
            let enorm = 2.0 / (mel_f[i + 2] - mel_f[i]);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - mel_f[i]) / lower_width;
                    let upper = (mel_f[i + 2] - f) / upper_width;
                    lower.min(upper).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}

/// Project a frame-major power spectrogram onto the mel filterbank
pub fn mel_spectrogram(power: &[Vec<f64>], filterbank: &[Vec<f64>]) -> Vec<Vec<f64>> {
    // Each triangle only covers a narrow run of bins
    let support: Vec<(usize, usize)> = filterbank
        .iter()
        .map(|weights| {
            let start = weights.iter().position(|&w| w > 0.0).unwrap_or(0);
            let end = weights.iter().rposition(|&w| w > 0.0).map_or(start, |i| i + 1);
            (start, end)
        })
        .collect();

    power
        .iter()
        .map(|frame| {
            filterbank
                .iter()
                .zip(&support)
                .map(|(weights, &(start, end))| {
                    weights[start..end]
                        .iter()
                        .zip(&frame[start..end])
                        .map(|(w, p)| w * p)
                        .sum()
                })
                .collect()
        })
        .collect()
}

/// dB-scaled mel spectrogram (`top_db` 80), frame-major
pub fn mel_db_spectrogram(power: &[Vec<f64>], sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let filterbank = mel_filterbank(sample_rate, n_fft, n_mels);
    power_to_db(&mel_spectrogram(power, &filterbank))
}

/// Orthonormal DCT-II of each dB mel frame, keeping `n_mfcc` coefficients
///
/// Returned frame-major (`mfcc[t][k]`).
pub fn mfcc(mel_db: &[Vec<f64>], n_mfcc: usize) -> Vec<Vec<f64>> {
    let Some(n_mels) = mel_db.first().map(Vec::len) else {
        return Vec::new();
    };
    let n = n_mels as f64;
    let basis: Vec<Vec<f64>> = (0..n_mfcc)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_mels)
                .map(|m| {
                    scale * (std::f64::consts::PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n)).cos()
                })
                .collect()
        })
        .collect();

    mel_db
        .iter()
        .map(|frame| {
            basis
                .iter()
                .map(|row| row.iter().zip(frame).map(|(b, x)| b * x).sum())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_breakpoints() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
        assert!((hz_to_mel(200.0) - 3.0).abs() < 1e-12);
        assert!((mel_to_hz(15.0) - 1000.0).abs() < 1e-9);
        for hz in [0.0, 123.4, 999.0, 1000.0, 4567.0, 11_025.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
    }

    #[test]
    fn test_filterbank_shape_and_coverage() {
        let fb = mel_filterbank(22_050, 2048, 128);
        assert_eq!(fb.len(), 128);
        assert!(fb.iter().all(|row| row.len() == 1025));
        // Every filter has some support and non-negative weights
        for row in &fb {
            assert!(row.iter().all(|&w| w >= 0.0));
            assert!(row.iter().any(|&w| w > 0.0));
        }
        // Each filter peaks inside its own band, so peaks are non-decreasing
        let peaks: Vec<usize> = fb
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(k, _)| k)
                    .unwrap()
            })
            .collect();
        assert!(peaks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_dct_of_constant_frame() {
        // A constant frame has energy only in coefficient 0
        let frame = vec![vec![-20.0; 128]];
        let coeffs = mfcc(&frame, 13);
        assert_eq!(coeffs[0].len(), 13);
        assert!((coeffs[0][0] - (-20.0 * 128f64.sqrt())).abs() < 1e-9);
        for &c in &coeffs[0][1..] {
            assert!(c.abs() < 1e-9);
        }
    }

    #[test]
    fn test_mfcc_empty() {
        assert!(mfcc(&[], 13).is_empty());
    }
}
