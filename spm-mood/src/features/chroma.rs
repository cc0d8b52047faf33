//! Chromagram from the power spectrogram
//!
//! Each FFT bin contributes to the 12 pitch classes through Gaussian bumps
//! centred on the bin's pitch, weighted toward the middle octaves
//! (centre octave 5, width 2). Rows start at C. Tuning is taken as A440.

const N_CHROMA: usize = 12;
const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Fractional octave number of `hz` relative to C0-ish (A440 / 16)
fn hz_to_octs(hz: f64) -> f64 {
    (hz / (440.0 / 16.0)).log2()
}

/// Chroma filterbank, `12` rows of `n_fft / 2 + 1` weights
pub fn chroma_filterbank(sample_rate: u32, n_fft: usize) -> Vec<Vec<f64>> {
    let n_chroma = N_CHROMA as f64;
    let n_bins = n_fft / 2 + 1;

    // Pitch (in chroma bins) of every FFT bin; bin 0 is placed 1.5 octaves
    // below bin 1. One extra entry is needed for the bin widths.
    let mut frq_bins = Vec::with_capacity(n_bins + 1);
    for k in 1..=n_bins {
        let hz = k as f64 * sample_rate as f64 / n_fft as f64;
        frq_bins.push(n_chroma * hz_to_octs(hz));
    }
    frq_bins.insert(0, frq_bins[0] - 1.5 * n_chroma);

    let bin_widths: Vec<f64> = (0..n_bins)
        .map(|k| (frq_bins[k + 1] - frq_bins[k]).max(1.0))
        .collect();

    let half = (n_chroma / 2.0).round();
    let mut weights = vec![vec![0.0; n_bins]; N_CHROMA];
    for k in 0..n_bins {
        let mut column = [0.0; N_CHROMA];
        for (c, slot) in column.iter_mut().enumerate() {
            let d = (frq_bins[k] - c as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma) - half;
            *slot = (-0.5 * (2.0 * d / bin_widths[k]).powi(2)).exp();
        }

        let norm = column.iter().map(|w| w * w).sum::<f64>().sqrt();
        let octave_weight =
            (-0.5 * ((frq_bins[k] / n_chroma - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();

        for (c, w) in column.iter().enumerate() {
            let normalised = if norm > f64::MIN_POSITIVE { w / norm } else { *w };
            // Roll so that row 0 is C rather than A
            let row = (c + N_CHROMA - 3) % N_CHROMA;
            weights[row][k] = normalised * octave_weight;
        }
    }
    weights
}

/// Chroma energy per frame, each frame scaled so its maximum is 1
///
/// Returned frame-major (`chroma[t][pitch_class]`). Silent frames stay zero.
pub fn chroma_stft(power: &[Vec<f64>], sample_rate: u32, n_fft: usize) -> Vec<Vec<f64>> {
    let filterbank = chroma_filterbank(sample_rate, n_fft);
    power
        .iter()
        .map(|frame| {
            let raw: Vec<f64> = filterbank
                .iter()
                .map(|weights| weights.iter().zip(frame).map(|(w, p)| w * p).sum())
                .collect();
            let peak = raw.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            if peak > f64::MIN_POSITIVE {
                raw.iter().map(|v| v / peak).collect()
            } else {
                raw
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stft::Spectrogram;

    #[test]
    fn test_filterbank_shape() {
        let fb = chroma_filterbank(22_050, 2048);
        assert_eq!(fb.len(), 12);
        assert!(fb.iter().all(|row| row.len() == 1025));
        assert!(fb.iter().flatten().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_a440_lands_on_pitch_class_a() {
        let sr = 22_050u32;
        let samples: Vec<f32> = (0..sr as usize)
            .map(|i| (0.5 * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / sr as f64).sin()) as f32)
            .collect();
        let spec = Spectrogram::compute(&samples, sr, 2048, 512);
        let chroma = chroma_stft(&spec.power(), sr, 2048);

        let frame = &chroma[20];
        assert_eq!(frame.len(), 12);
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(c, _)| c)
            .unwrap();
        // C = 0, ..., A = 9
        assert_eq!(peak, 9);
        assert!((frame[9] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_silence_stays_zero() {
        let chroma = chroma_stft(&vec![vec![0.0; 1025]; 3], 22_050, 2048);
        assert!(chroma.iter().flatten().all(|&v| v == 0.0));
    }
}
