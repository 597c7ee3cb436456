use anyhow::{Context, Result};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use index_bias::config::Config;
use index_bias::forecast::{DriftForecaster, Forecaster};
use index_bias::market::YahooChartClient;
use index_bias::monitor::Monitor;
use index_bias::trading::TradeLedger;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    cfg.validate().context("Invalid configuration")?;

    let market = YahooChartClient::new(Duration::from_secs(cfg.cache_ttl_secs))?;
    let forecaster: Option<Box<dyn Forecaster>> = if cfg.forecast.enabled {
        Some(Box::new(DriftForecaster::new(cfg.forecast.window)))
    } else {
        None
    };

    let mut ledger = TradeLedger::new(&cfg);
    let mut monitor = Monitor::new(cfg, market, forecaster);
    monitor.run(&mut ledger).await?;

    Ok(())
}
