/// Rolling z-score of the latest value against the trailing `window`
/// (sample standard deviation). `None` when the window is not filled or
/// the window is flat.
pub fn zscore(values: &[f64], window: usize) -> Option<f64> {
    if window < 2 || values.len() < window {
        return None;
    }

    let slice = &values[values.len() - window..];
    let n = window as f64;
    let mean = slice.iter().sum::<f64>() / n;
    let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }

    let last = *slice.last()?;
    Some((last - mean) / std)
}
