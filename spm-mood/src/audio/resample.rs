//! Sample rate conversion
//!
//! Single-pass sinc resampling with rubato. The whole signal is processed as
//! one chunk and the resampler is flushed. `SincFixedIn::process` already
//! returns delay-aligned frames, so the flushed output is only truncated to
//! `round(len * ratio)` samples.

use super::DecodeError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Resample a mono signal from `source_rate` to `target_rate`
///
/// Returns the input untouched when the rates already match or when the
/// input is empty.
pub fn resample_mono(
    samples: Vec<f32>,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, DecodeError> {
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples);
    }
    if source_rate == 0 {
        return Err(DecodeError::Resample("source sample rate is zero".to_string()));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let input_len = samples.len();
    let expected_len = (input_len as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, input_len, 1)
        .map_err(|e| DecodeError::Resample(e.to_string()))?;

    let mut output = resampler
        .process(&[samples.as_slice()], None)
        .map_err(|e| DecodeError::Resample(e.to_string()))?
        .swap_remove(0);

    // Flush the filter tail so the last frames are not lost
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| DecodeError::Resample(e.to_string()))?
        .swap_remove(0);
    output.extend_from_slice(&tail);

    output.truncate(expected_len);
    output.resize(expected_len, 0.0);

    debug!(
        input_frames = input_len,
        output_frames = output.len(),
        source_rate,
        target_rate,
        "Resampled signal"
    );

    Ok(output)
}
