use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::MarketData;
use crate::models::{Candle, CandleSeries, Timeframe};

/// Replays pre-loaded bars per symbol.
/// A cursor (`now`) controls which bars are visible: only bars with
/// timestamp <= now are returned, simulating a forward walk.
pub struct ReplayFeed {
    data: HashMap<String, Vec<Candle>>,
    now: DateTime<Utc>,
    limit: usize,
}

impl ReplayFeed {
    pub fn new(limit: usize) -> Self {
        Self {
            data: HashMap::new(),
            now: DateTime::<Utc>::MIN_UTC,
            limit,
        }
    }

    /// Load bars for a symbol. Unsorted input is sorted oldest-first.
    pub fn load(&mut self, symbol: &str, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.timestamp);
        self.data.insert(symbol.to_string(), candles);
    }

    pub fn set_time(&mut self, t: DateTime<Utc>) {
        self.now = t;
    }

    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.last().map(|c| c.timestamp))
            .max()
    }

    /// Every timestamp of `symbol`, in order. Drives the replay walk.
    pub fn timestamps(&self, symbol: &str) -> Vec<DateTime<Utc>> {
        self.data
            .get(symbol)
            .map(|v| v.iter().map(|c| c.timestamp).collect())
            .unwrap_or_default()
    }

    fn visible(&self, symbol: &str) -> CandleSeries {
        let Some(all) = self.data.get(symbol) else {
            return CandleSeries::default();
        };

        let end = match all.partition_point(|c| c.timestamp <= self.now) {
            0 => return CandleSeries::default(),
            n => n,
        };

        let start = end.saturating_sub(self.limit);
        CandleSeries::new(all[start..end].to_vec())
    }
}

#[async_trait]
impl MarketData for ReplayFeed {
    /// The range string is ignored; the window is the feed's bar limit.
    async fn fetch_bars(
        &mut self,
        symbol: &str,
        _timeframe: Timeframe,
        _range: &str,
    ) -> Result<CandleSeries> {
        Ok(self.visible(symbol))
    }
}
