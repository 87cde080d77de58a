/// Divides `numerator` by `denominator`, returning 0.0 when the denominator is
/// zero or the quotient is not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() { quotient } else { 0.0 }
}

/// Quantile `q` (0.0..=1.0) of `values` using linear interpolation between the
/// two closest ranks. NaN values are ignored; `None` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Flags every value strictly above the batch quantile `q`.
pub fn above_quantile(values: &[f64], q: f64) -> Vec<bool> {
    match quantile(values, q) {
        Some(threshold) => values.iter().map(|v| *v > threshold).collect(),
        None => vec![false; values.len()],
    }
}
