use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::normalize::{normalize_columns, RawColumns};
use super::MarketData;
use crate::models::{CandleSeries, Timeframe};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const CHART_PATH: &str = "/v8/finance/chart";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Map a chart payload into normalizer columns.
///
/// A result with no timestamps is a valid empty window (market closed,
/// fresh listing); a provider-side error object is not.
fn into_columns(resp: ChartResponse) -> Result<RawColumns> {
    if let Some(err) = resp.chart.error {
        bail!("Chart API error {}: {}", err.code, err.description);
    }

    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(RawColumns::default());
    };

    let quote = result.indicators.quote.into_iter().next();
    let adj_close = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .and_then(|a| a.adjclose);

    let mut raw = RawColumns {
        timestamps: result.timestamp.unwrap_or_default(),
        adj_close,
        ..Default::default()
    };
    if let Some(q) = quote {
        raw.open = q.open;
        raw.high = q.high;
        raw.low = q.low;
        raw.close = q.close;
        raw.volume = q.volume;
    }
    Ok(raw)
}

/// Thin client for the public v8 chart endpoint.
pub struct YahooChartClient {
    client: Client,
    base_url: String,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, CandleSeries)>,
    cache_ttl: Duration,
}

impl YahooChartClient {
    /// Responses are reused for `cache_ttl`; a zero TTL disables the cache.
    pub fn new(cache_ttl: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, cache_ttl)
    }

    pub fn with_base_url(base_url: impl Into<String>, cache_ttl: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            last_request: None,
            cache: HashMap::new(),
            cache_ttl,
        })
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    pub async fn fetch_chart(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        range: &str,
    ) -> Result<CandleSeries> {
        let cache_key = format!("{}_{}_{}", symbol, timeframe, range);
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < self.cache_ttl {
                return Ok(series.clone());
            }
        }

        self.rate_limit().await;

        let url = format!("{}{}/{}", self.base_url, CHART_PATH, symbol);
        debug!(symbol, interval = timeframe.chart_interval(), range, "fetching chart");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("range", range),
                ("interval", timeframe.chart_interval()),
                ("includePrePost", "false"),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to fetch chart for {}", symbol))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Chart API error {} for {}: {}", status, symbol, body);
        }

        let data: ChartResponse = resp.json().await.context("Failed to parse chart response")?;
        let series = normalize_columns(&into_columns(data)?);
        debug!(symbol, bars = series.len(), "chart normalized");

        self.cache.insert(cache_key, (Instant::now(), series.clone()));
        Ok(series)
    }
}

#[async_trait]
impl MarketData for YahooChartClient {
    async fn fetch_bars(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        range: &str,
    ) -> Result<CandleSeries> {
        self.fetch_chart(symbol, timeframe, range).await
    }
}
