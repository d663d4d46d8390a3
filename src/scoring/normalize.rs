// Z-score normalization for comparing raw bias magnitudes across groups,
// layers, or models.

/// Normalize a series to zero mean and unit sample standard deviation.
///
/// Series shorter than two values, or with zero spread, normalize to all
/// zeros, since there is no scale to express a deviation against.
pub fn z_score_normalize(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return vec![0.0; values.len()];
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

    if std_dev < f64::EPSILON {
        return vec![0.0; values.len()];
    }

    values.iter().map(|v| (v - mean) / std_dev).collect()
}
