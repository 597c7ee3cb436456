use chrono::{DateTime, Duration, Utc};

use crate::config::{Config, ForecastConfig, IndicatorConfig, ScorerConfig};
use crate::models::{Candle, CandleSeries, Timeframe};

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Build a series from (open, high, low, close) tuples, one minute apart.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let base = base_time();

    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + Duration::minutes(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

/// Build 15-minute bars from closes only. Each bar opens at the previous
/// close with a small wick either side.
pub fn make_closes(closes: &[f64]) -> CandleSeries {
    let base = base_time();

    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.05,
                low: open.min(close) - 0.05,
                close,
                volume: 100.0,
            }
        })
        .collect();

    CandleSeries::new(candles)
}

/// Create n rising (bullish) candles starting from `start` price.
pub fn make_bullish_trend(n: usize, start: f64) -> CandleSeries {
    let base = base_time();

    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let open = start + i as f64 * 10.0;
            let close = open + 8.0;
            Candle {
                timestamp: base + Duration::minutes(i as i64),
                open,
                high: close + 2.0,
                low: open - 1.0,
                close,
                volume: 100.0,
            }
        })
        .collect();

    CandleSeries::new(candles)
}

/// Create n falling (bearish) candles starting from `start` price.
pub fn make_bearish_trend(n: usize, start: f64) -> CandleSeries {
    let base = base_time();

    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let open = start - i as f64 * 10.0;
            let close = open - 8.0;
            Candle {
                timestamp: base + Duration::minutes(i as i64),
                open,
                high: open + 1.0,
                low: close - 2.0,
                close,
                volume: 100.0,
            }
        })
        .collect();

    CandleSeries::new(candles)
}

pub fn test_indicator_config() -> IndicatorConfig {
    IndicatorConfig::default()
}

/// A Config suitable for testing: no VIX, no forecast, frictionless paper trading.
pub fn default_test_config() -> Config {
    Config {
        symbol: "SPY".to_string(),
        vix_symbol: None,
        timeframe: Timeframe::M15,
        lookback_range: "5d".to_string(),
        refresh_secs: 1,
        cache_ttl_secs: 0,
        indicators: test_indicator_config(),
        scorer: ScorerConfig::default(),
        forecast: ForecastConfig::default(),
        paper_trade: true,
        paper_quantity: 1.0,
        fee_rate: 0.0,
        slippage_rate: 0.0,
        log_level: "debug".to_string(),
    }
}
