#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use index_bias::config::{Config, ForecastConfig, IndicatorConfig, ScorerConfig};
use index_bias::market::ReplayFeed;
use index_bias::models::{Candle, CandleSeries, Timeframe};

pub const SYMBOL: &str = "SPY";
pub const VIX: &str = "^VIX";

/// 15-minute bars from closes only, opening at the previous close.
pub fn make_closes(closes: &[f64]) -> CandleSeries {
    let base = DateTime::parse_from_rfc3339("2024-01-16T14:30:00Z")
        .unwrap()
        .with_timezone(&Utc);

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
                volume: 1_000.0,
            }
        })
        .collect();

    CandleSeries::new(candles)
}

/// `n` closes climbing `step` per bar from `start`.
pub fn rising(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Climb for `up` bars then fall for `down` bars at the same pace.
pub fn rise_then_fall(up: usize, down: usize, start: f64, step: f64) -> Vec<f64> {
    let mut closes = rising(up, start, step);
    let peak = closes[up - 1];
    closes.extend((1..=down).map(|i| peak - i as f64 * step));
    closes
}

/// A flat VIX series aligned with `bars`.
pub fn vix_at(bars: &CandleSeries, level: f64) -> Vec<Candle> {
    bars.iter()
        .map(|c| Candle {
            timestamp: c.timestamp,
            open: level,
            high: level,
            low: level,
            close: level,
            volume: 0.0,
        })
        .collect()
}

/// Feed positioned at the end of `bars`.
pub fn feed_at_end(bars: &CandleSeries) -> ReplayFeed {
    let mut feed = ReplayFeed::new(500);
    feed.load(SYMBOL, bars.as_slice().to_vec());
    if let Some(last) = bars.last() {
        feed.set_time(last.timestamp);
    }
    feed
}

/// Frictionless paper trading, default gates, no VIX, no forecast.
pub fn test_config() -> Config {
    Config {
        symbol: SYMBOL.to_string(),
        vix_symbol: None,
        timeframe: Timeframe::M15,
        lookback_range: "5d".to_string(),
        refresh_secs: 1,
        cache_ttl_secs: 0,
        indicators: IndicatorConfig::default(),
        scorer: ScorerConfig::default(),
        forecast: ForecastConfig::default(),
        paper_trade: true,
        paper_quantity: 1.0,
        fee_rate: 0.0,
        slippage_rate: 0.0,
        log_level: "debug".to_string(),
    }
}
