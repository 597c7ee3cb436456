pub mod normalize;
pub mod replay;
pub mod yahoo;

pub use normalize::{normalize_columns, RawColumns};
pub use replay::ReplayFeed;
pub use yahoo::YahooChartClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CandleSeries, Timeframe};

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Bars for `symbol`, oldest first. May legitimately be empty.
    async fn fetch_bars(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        range: &str,
    ) -> Result<CandleSeries>;

    /// Latest close of `symbol`, if the provider has any bars.
    async fn latest_close(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        range: &str,
    ) -> Result<Option<f64>> {
        let bars = self.fetch_bars(symbol, timeframe, range).await?;
        Ok(bars.last().map(|c| c.close))
    }
}
