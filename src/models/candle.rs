use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn total_range(&self) -> f64 {
        self.high - self.low
    }

    /// True range against the previous bar's close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        self.total_range().max(hc).max(lc)
    }
}

/// Timestamp-ordered bars, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The bar immediately before the latest one.
    pub fn previous(&self) -> Option<&Candle> {
        self.candles.len().checked_sub(2).and_then(|i| self.candles.get(i))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl IntoIterator for CandleSeries {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_candles;

    #[test]
    fn candle_true_range_uses_gap_to_prev_close() {
        let c = Candle {
            timestamp: Utc::now(),
            open: 100.0,
            high: 104.0,
            low: 99.0,
            close: 103.0,
            volume: 10.0,
        };
        assert!((c.total_range() - 5.0).abs() < 1e-9);
        // gap down from 110: |99 - 110| = 11 dominates
        assert!((c.true_range(110.0) - 11.0).abs() < 1e-9);
        assert!((c.true_range(101.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn series_previous_and_last() {
        let s = make_candles(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 103.0, 99.0, 102.0),
        ]);
        assert!((s.previous().unwrap().close - 100.0).abs() < 1e-9);
        assert!((s.last().unwrap().close - 102.0).abs() < 1e-9);
        assert_eq!(s.closes(), vec![100.0, 102.0]);
    }

    #[test]
    fn single_bar_has_no_previous() {
        let s = make_candles(&[(100.0, 101.0, 99.0, 100.0)]);
        assert!(s.previous().is_none());
        assert!(CandleSeries::default().previous().is_none());
    }
}
