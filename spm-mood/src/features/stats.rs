//! Summary statistics over feature frames
//!
//! All statistics run over every entry of the input (a framed matrix is
//! flattened). `std` is the population standard deviation.

/// Arithmetic mean, 0 for an empty input
pub fn mean<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Population standard deviation (divides by N), 0 for an empty input
pub fn std<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64> + Clone,
{
    let m = mean(values.clone());
    let (sq, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + (v - m) * (v - m), n + 1));
    if count == 0 {
        0.0
    } else {
        (sq / count as f64).sqrt()
    }
}

/// Sample standard deviation (divides by N - 1), 0 for fewer than 2 values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sq / (values.len() - 1) as f64).sqrt()
}

/// Median (mean of the two middle values for an even count), NaN when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Mean over every entry of a frame-major matrix
pub fn matrix_mean(matrix: &[Vec<f64>]) -> f64 {
    mean(matrix.iter().flatten())
}

/// Population std over every entry of a frame-major matrix
pub fn matrix_std(matrix: &[Vec<f64>]) -> f64 {
    std(matrix.iter().flatten())
}
