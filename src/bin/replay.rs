use anyhow::{bail, Context, Result};
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use index_bias::config::Config;
use index_bias::forecast::{DriftForecaster, Forecaster};
use index_bias::market::ReplayFeed;
use index_bias::models::Candle;
use index_bias::monitor::{CycleOutcome, Monitor};
use index_bias::trading::TradeLedger;

fn load_candles(path: &str) -> Result<Vec<Candle>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse candles in {}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    cfg.validate().context("Invalid configuration")?;

    // replay <bars.json> [vix.json]
    let args: Vec<String> = std::env::args().collect();
    let Some(bars_path) = args.get(1) else {
        bail!("usage: replay <bars.json> [vix.json]");
    };

    let bars = load_candles(bars_path)?;
    if bars.is_empty() {
        bail!("{} contains no bars", bars_path);
    }

    // Cap the visible window the way the live chart range would.
    let mut feed = ReplayFeed::new(500);
    feed.load(&cfg.symbol, bars);
    if let (Some(path), Some(symbol)) = (args.get(2), cfg.vix_symbol.as_deref()) {
        feed.load(symbol, load_candles(path)?);
    }
    let timestamps = feed.timestamps(&cfg.symbol);

    println!("{}", "=".repeat(60));
    println!("  INDEX BIAS REPLAY");
    println!("  Symbol:  {} ({})", cfg.symbol, cfg.timeframe);
    println!("  Bars:    {}", timestamps.len());
    println!(
        "  Period:  {} -> {}",
        timestamps[0].format("%Y-%m-%d %H:%M"),
        timestamps[timestamps.len() - 1].format("%Y-%m-%d %H:%M")
    );
    println!("{}", "=".repeat(60));

    let forecaster: Option<Box<dyn Forecaster>> = if cfg.forecast.enabled {
        Some(Box::new(DriftForecaster::new(cfg.forecast.window)))
    } else {
        None
    };

    let mut ledger = TradeLedger::new(&cfg);
    let mut monitor = Monitor::new(cfg, feed, forecaster);

    let (mut scored, mut gated, mut skipped) = (0usize, 0usize, 0usize);
    for ts in &timestamps {
        monitor.market_mut().set_time(*ts);
        match monitor.run_cycle(&mut ledger).await {
            CycleOutcome::Scored(report) if report.decision.is_gated() => gated += 1,
            CycleOutcome::Scored(_) => scored += 1,
            CycleOutcome::InsufficientData(_) | CycleOutcome::Unavailable(_) => skipped += 1,
        }
    }

    let last = timestamps[timestamps.len() - 1];
    monitor.shutdown(&mut ledger, last);

    let stats = ledger.stats();
    info!("Replay finished: {} scored, {} gated, {} skipped", scored, gated, skipped);

    println!();
    println!("{}", "=".repeat(60));
    println!("  Cycles:      {}", timestamps.len());
    println!("  Scored:      {} (+{} gated, {} warming up)", scored, gated, skipped);
    println!("  Trades:      {}", stats.total_trades);
    println!("  Win rate:    {:.1}%", stats.win_rate);
    println!("  Total PnL:   {:+.2}", stats.total_pnl);
    println!("  Avg win:     {:+.2}", stats.avg_win);
    println!("  Avg loss:    {:+.2}", stats.avg_loss);
    println!("  Best/Worst:  {:+.2} / {:+.2}", stats.best_trade, stats.worst_trade);
    println!("{}", "=".repeat(60));

    Ok(())
}
