use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{atr, ema, macd, rsi, zscore, MacdValue};
use crate::config::IndicatorConfig;
use crate::models::CandleSeries;

/// Latest value of every indicator for one bar series.
///
/// Fields stay `None` while their window is unfilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub prev_close: Option<f64>,
    pub bars: usize,
    pub fast_ema: Option<f64>,
    pub slow_ema: Option<f64>,
    pub atr: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdValue>,
    pub zscore: Option<f64>,
}

impl IndicatorSnapshot {
    /// `None` only for an empty series.
    pub fn compute(series: &CandleSeries, cfg: &IndicatorConfig) -> Option<Self> {
        let last = series.last()?;
        let closes = series.closes();

        Some(Self {
            timestamp: last.timestamp,
            close: last.close,
            prev_close: series.previous().map(|c| c.close),
            bars: series.len(),
            fast_ema: ema(&closes, cfg.fast_ema),
            slow_ema: ema(&closes, cfg.slow_ema),
            atr: atr(series.as_slice(), cfg.atr_period, cfg.atr_method),
            rsi: rsi(&closes, cfg.rsi_period),
            macd: macd(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal),
            zscore: zscore(&closes, cfg.zscore_window),
        })
    }

    /// Names of the scoring inputs that are still undefined.
    pub fn missing(&self, need_macd: bool) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.prev_close.is_none() {
            out.push("previous_close");
        }
        if self.fast_ema.is_none() {
            out.push("fast_ema");
        }
        if self.slow_ema.is_none() {
            out.push("slow_ema");
        }
        if self.atr.is_none() {
            out.push("atr");
        }
        if need_macd && self.macd.is_none() {
            out.push("macd");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_bullish_trend, test_indicator_config};

    #[test]
    fn empty_series_has_no_snapshot() {
        let cfg = test_indicator_config();
        assert!(IndicatorSnapshot::compute(&CandleSeries::default(), &cfg).is_none());
    }

    #[test]
    fn short_series_reports_missing_windows() {
        let cfg = test_indicator_config();
        let series = make_bullish_trend(10, 100.0);
        let snap = IndicatorSnapshot::compute(&series, &cfg).unwrap();
        assert!(snap.fast_ema.is_some());
        assert!(snap.slow_ema.is_none());
        assert!(snap.macd.is_none());
        assert_eq!(snap.missing(false), vec!["slow_ema", "atr"]);
        assert_eq!(snap.missing(true), vec!["slow_ema", "atr", "macd"]);
    }

    #[test]
    fn single_bar_misses_previous_close() {
        let cfg = test_indicator_config();
        let series = make_bullish_trend(1, 100.0);
        let snap = IndicatorSnapshot::compute(&series, &cfg).unwrap();
        assert!(snap.missing(false).contains(&"previous_close"));
    }

    #[test]
    fn long_series_fills_everything() {
        let cfg = test_indicator_config();
        let series = make_bullish_trend(60, 100.0);
        let snap = IndicatorSnapshot::compute(&series, &cfg).unwrap();
        assert!(snap.missing(true).is_empty());
        assert!(snap.rsi.is_some());
        assert!(snap.zscore.is_some());
        assert!(snap.fast_ema.unwrap() > snap.slow_ema.unwrap());
        assert_eq!(snap.bars, 60);
    }
}
