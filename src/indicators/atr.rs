use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Candle;

/// How the per-bar range is measured before averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrMethod {
    /// Wilder-smoothed true range. Needs `period + 1` bars.
    TrueRange,
    /// Rolling mean of high - low. Needs `period` bars.
    HighLow,
    /// Rolling mean of |close - previous close|. Needs `period + 1` bars.
    CloseToClose,
}

impl AtrMethod {
    pub fn from_str_loose(s: &str) -> Option<AtrMethod> {
        match s.trim().to_lowercase().as_str() {
            "true_range" | "wilder" | "tr" => Some(AtrMethod::TrueRange),
            "high_low" | "hl" | "range" => Some(AtrMethod::HighLow),
            "close_to_close" | "close" | "cc" => Some(AtrMethod::CloseToClose),
            _ => None,
        }
    }

    pub fn min_bars(&self, period: usize) -> usize {
        match self {
            AtrMethod::HighLow => period,
            AtrMethod::TrueRange | AtrMethod::CloseToClose => period + 1,
        }
    }
}

impl fmt::Display for AtrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtrMethod::TrueRange => write!(f, "true_range"),
            AtrMethod::HighLow => write!(f, "high_low"),
            AtrMethod::CloseToClose => write!(f, "close_to_close"),
        }
    }
}

/// Latest ATR value for `candles` (oldest first).
pub fn atr(candles: &[Candle], period: usize, method: AtrMethod) -> Option<f64> {
    if period == 0 || candles.len() < method.min_bars(period) {
        return None;
    }

    let value = match method {
        AtrMethod::HighLow => {
            let window = &candles[candles.len() - period..];
            window.iter().map(Candle::total_range).sum::<f64>() / period as f64
        }
        AtrMethod::CloseToClose => {
            let window = &candles[candles.len() - period - 1..];
            window
                .windows(2)
                .map(|w| (w[1].close - w[0].close).abs())
                .sum::<f64>()
                / period as f64
        }
        AtrMethod::TrueRange => {
            let trs: Vec<f64> = candles
                .windows(2)
                .map(|w| w[1].true_range(w[0].close))
                .collect();
            let period_f = period as f64;
            let seed = trs[..period].iter().sum::<f64>() / period_f;
            trs[period..]
                .iter()
                .fold(seed, |atr, &tr| (atr * (period_f - 1.0) + tr) / period_f)
        }
    };

    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_candles;

    fn flat_bars(n: usize, range: f64) -> Vec<Candle> {
        let data: Vec<(f64, f64, f64, f64)> = (0..n)
            .map(|_| (100.0, 100.0 + range / 2.0, 100.0 - range / 2.0, 100.0))
            .collect();
        make_candles(&data).as_slice().to_vec()
    }

    #[test]
    fn window_boundaries_per_method() {
        let bars = flat_bars(14, 2.0);
        assert!(atr(&bars, 14, AtrMethod::HighLow).is_some());
        assert_eq!(atr(&bars, 14, AtrMethod::TrueRange), None);
        assert_eq!(atr(&bars, 14, AtrMethod::CloseToClose), None);
        assert_eq!(atr(&bars[..13], 14, AtrMethod::HighLow), None);
        assert_eq!(atr(&bars, 0, AtrMethod::HighLow), None);
    }

    #[test]
    fn high_low_is_mean_range_of_last_window() {
        let mut bars = flat_bars(10, 4.0);
        bars.extend(flat_bars(5, 2.0));
        let v = atr(&bars, 5, AtrMethod::HighLow).unwrap();
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn close_to_close_mean_abs_change() {
        let s = make_candles(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 103.0, 99.0, 102.0),
            (102.0, 103.0, 98.0, 99.0),
        ]);
        // |102-100| = 2, |99-102| = 3 -> mean 2.5
        let v = atr(s.as_slice(), 2, AtrMethod::CloseToClose).unwrap();
        assert!((v - 2.5).abs() < 1e-9);
    }

    #[test]
    fn true_range_constant_bars() {
        let bars = flat_bars(30, 3.0);
        let v = atr(&bars, 14, AtrMethod::TrueRange).unwrap();
        assert!((v - 3.0).abs() < 1e-9);
    }

    #[test]
    fn parses_method_names() {
        assert_eq!(AtrMethod::from_str_loose("Wilder"), Some(AtrMethod::TrueRange));
        assert_eq!(AtrMethod::from_str_loose("high_low"), Some(AtrMethod::HighLow));
        assert_eq!(AtrMethod::from_str_loose("cc"), Some(AtrMethod::CloseToClose));
        assert_eq!(AtrMethod::from_str_loose("sma"), None);
    }
}
