/// Wilder RSI over `closes` (oldest first). Needs `period + 1` closes.
///
/// Returns 100 when there were no losses in the window, including a flat
/// series.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let period_f = period as f64;
    let mut avg_gain = changes[..period].iter().copied().map(gain).sum::<f64>() / period_f;
    let mut avg_loss = changes[..period].iter().copied().map(loss).sum::<f64>() / period_f;

    for &c in &changes[period..] {
        avg_gain = (avg_gain * (period_f - 1.0) + gain(c)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss(c)) / period_f;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
