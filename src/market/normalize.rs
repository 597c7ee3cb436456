use chrono::DateTime;

use crate::models::{Candle, CandleSeries};

/// Column-oriented provider payload. Any column may be absent or shorter
/// than `timestamps`, and any cell may be null.
#[derive(Debug, Clone, Default)]
pub struct RawColumns {
    /// Unix seconds.
    pub timestamps: Vec<i64>,
    pub open: Option<Vec<Option<f64>>>,
    pub high: Option<Vec<Option<f64>>>,
    pub low: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
    pub adj_close: Option<Vec<Option<f64>>>,
    pub volume: Option<Vec<Option<f64>>>,
}

fn cell(col: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    col.as_ref()
        .and_then(|c| c.get(i).copied().flatten())
        .filter(|v| v.is_finite())
}

/// Turn provider columns into a clean series.
///
/// - close falls back to adjusted close; rows with neither are dropped
/// - open falls back to close, high/low to the max/min of open and close
/// - missing volume is 0
/// - non-positive prices are dropped
/// - output is sorted by timestamp with duplicates removed (last wins)
pub fn normalize_columns(raw: &RawColumns) -> CandleSeries {
    let mut candles: Vec<Candle> = raw
        .timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let timestamp = DateTime::from_timestamp(ts, 0)?;
            let close = cell(&raw.close, i).or_else(|| cell(&raw.adj_close, i))?;
            if close <= 0.0 {
                return None;
            }
            let open = cell(&raw.open, i).filter(|v| *v > 0.0).unwrap_or(close);
            let body_high = open.max(close);
            let body_low = open.min(close);
            let high = cell(&raw.high, i).unwrap_or(body_high).max(body_high);
            let low = cell(&raw.low, i)
                .filter(|v| *v > 0.0)
                .unwrap_or(body_low)
                .min(body_low);

            Some(Candle {
                timestamp,
                open,
                high,
                low,
                close,
                volume: cell(&raw.volume, i).unwrap_or(0.0),
            })
        })
        .collect();

    candles.sort_by_key(|c| c.timestamp);
    // keep the most recent revision of a repeated bucket
    candles.reverse();
    candles.dedup_by_key(|c| c.timestamp);
    candles.reverse();

    CandleSeries::new(candles)
}
