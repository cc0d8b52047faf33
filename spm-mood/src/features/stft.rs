//! Short-time Fourier transform
//!
//! Centred framing: the signal is zero-padded by `n_fft / 2` on both sides so
//! frame `t` is centred on sample `t * hop`. The frame count is therefore
//! `1 + len / hop`.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Periodic Hann window of length `n` (the DFT-even variant)
pub fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .collect()
}

/// Number of centred frames for a signal of `len` samples
pub fn frame_count(len: usize, hop: usize) -> usize {
    1 + len / hop
}

/// Magnitude spectrogram, stored frame-major (`frames[t][k]`)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f64>>,
    pub n_fft: usize,
    pub hop: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Compute `|STFT|` of `samples` with a periodic Hann window
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop: usize) -> Self {
        let window = hann_window(n_fft);
        let pad = n_fft / 2;
        let n_frames = frame_count(samples.len(), hop);
        let n_bins = n_fft / 2 + 1;

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        let mut buffer = vec![Complex::default(); n_fft];

        let mut frames = Vec::with_capacity(n_frames);
        for t in 0..n_frames {
            let start = (t * hop) as isize - pad as isize;
            for (j, slot) in buffer.iter_mut().enumerate() {
                let idx = start + j as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize] as f64
                } else {
                    0.0
                };
                *slot = Complex::new(sample * window[j], 0.0);
            }
            fft.process_with_scratch(&mut buffer, &mut scratch);
            frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
        }

        Self {
            frames,
            n_fft,
            hop,
            sample_rate,
        }
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Centre frequency of every bin, in Hz
    pub fn frequencies(&self) -> Vec<f64> {
        fft_frequencies(self.sample_rate, self.n_fft)
    }

    /// Power spectrogram (`|STFT|^2`)
    pub fn power(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|m| m * m).collect())
            .collect()
    }
}

/// Bin centre frequencies `k * sr / n_fft` for `k` in `0..=n_fft/2`
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}
