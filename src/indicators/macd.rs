use serde::{Deserialize, Serialize};

use super::ema::ema_series;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD = EMA(fast) - EMA(slow), signal = EMA(signal) of the MACD line.
///
/// Needs `slow + signal - 1` closes. `None` when `fast >= slow`.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if fast == 0 || signal == 0 || fast >= slow || closes.len() < slow + signal - 1 {
        return None;
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    // slow_ema[j] sits at close index slow-1+j, the same close as fast_ema[j + slow - fast]
    let offset = slow - fast;
    let line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(j, s)| fast_ema[j + offset] - s)
        .collect();

    let signal_series = ema_series(&line, signal);
    let signal_value = *signal_series.last()?;
    let line_value = *line.last()?;

    Some(MacdValue {
        line: line_value,
        signal: signal_value,
        histogram: line_value - signal_value,
    })
}
