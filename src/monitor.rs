use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::US::Eastern;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::forecast::{Forecast, Forecaster};
use crate::indicators::IndicatorSnapshot;
use crate::market::MarketData;
use crate::strategies::{Decision, ScoreInputs, SignalError, SignalScorer};
use crate::trading::{TradeLedger, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastStatus {
    Disabled,
    Unavailable(String),
    Available(Forecast),
}

impl ForecastStatus {
    /// Mean of the one-step-ahead forecast, when there is one.
    pub fn next_mean(&self) -> Option<f64> {
        match self {
            ForecastStatus::Available(f) => f.next().map(|p| p.mean),
            _ => None,
        }
    }
}

/// Everything one scored refresh produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: IndicatorSnapshot,
    pub vix: Option<f64>,
    pub forecast: ForecastStatus,
    pub decision: Decision,
    pub opened: Option<TradeRecord>,
    pub closed: Vec<TradeRecord>,
}

impl CycleReport {
    /// VIX strictly above the elevated threshold.
    pub fn high_volatility(&self, elevated: Option<f64>) -> bool {
        matches!((self.vix, elevated), (Some(level), Some(limit)) if level > limit)
    }
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The provider failed or returned nothing. Retried next interval.
    Unavailable(String),
    /// Indicator windows are not filled yet.
    InsufficientData(SignalError),
    Scored(Box<CycleReport>),
}

/// Runs the fetch, indicators, forecast, score and ledger steps strictly
/// in sequence, one refresh at a time.
pub struct Monitor<M: MarketData> {
    config: Config,
    market: M,
    forecaster: Option<Box<dyn Forecaster>>,
    scorer: SignalScorer,
    last_price: Option<f64>,
    cycles: u64,
}

impl<M: MarketData> Monitor<M> {
    pub fn new(config: Config, market: M, forecaster: Option<Box<dyn Forecaster>>) -> Self {
        info!("{}", "=".repeat(60));
        info!("Index bias monitor starting up");
        info!("Symbol: {} ({}, range {})", config.symbol, config.timeframe, config.lookback_range);
        info!(
            "Volatility index: {}",
            config.vix_symbol.as_deref().unwrap_or("off")
        );
        info!(
            "Inputs: {} | cutoffs strong={} mild={}",
            config.scorer.input_count(),
            config.scorer.cutoffs.strong,
            config.scorer.cutoffs.mild
        );
        info!(
            "Forecast: {}",
            forecaster.as_ref().map(|f| f.name()).unwrap_or("off")
        );
        info!(
            "Paper trading: {}",
            if config.paper_trade { "on" } else { "off" }
        );
        info!("{}", "=".repeat(60));

        let scorer = SignalScorer::new(config.scorer.clone());
        Self {
            config,
            market,
            forecaster,
            scorer,
            last_price: None,
            cycles: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn market_mut(&mut self) -> &mut M {
        &mut self.market
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One refresh. Never fails: provider errors, short history and
    /// forecast errors are all reported through the outcome.
    pub async fn run_cycle(&mut self, ledger: &mut TradeLedger) -> CycleOutcome {
        self.cycles += 1;
        let cfg = &self.config;

        let bars = match self
            .market
            .fetch_bars(&cfg.symbol, cfg.timeframe, &cfg.lookback_range)
            .await
        {
            Ok(bars) => bars,
            Err(e) => {
                let reason = format!("fetch failed for {}: {:#}", cfg.symbol, e);
                warn!("{}", reason);
                return CycleOutcome::Unavailable(reason);
            }
        };

        let Some(snapshot) = IndicatorSnapshot::compute(&bars, &cfg.indicators) else {
            let reason = format!("no bars returned for {}", cfg.symbol);
            warn!("{}", reason);
            return CycleOutcome::Unavailable(reason);
        };
        debug!(bars = snapshot.bars, close = snapshot.close, "bars fetched");

        self.last_price = Some(snapshot.close);
        let closed = ledger.close_out(snapshot.close, snapshot.timestamp);

        let vix = self.fetch_vix().await;
        let forecast = self.run_forecast(&bars.closes());

        let inputs = match ScoreInputs::from_snapshot(
            &snapshot,
            vix,
            forecast.next_mean(),
            self.scorer.config(),
        ) {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!("{}: {}", self.config.symbol, e);
                return CycleOutcome::InsufficientData(e);
            }
        };

        let decision = self.scorer.evaluate(&inputs);
        let opened = ledger.open(&decision, snapshot.timestamp).cloned();

        let report = CycleReport {
            snapshot,
            vix,
            forecast,
            decision,
            opened,
            closed,
        };
        self.print_status(&report, ledger);

        CycleOutcome::Scored(Box::new(report))
    }

    async fn fetch_vix(&mut self) -> Option<f64> {
        let symbol = self.config.vix_symbol.clone()?;
        match self
            .market
            .latest_close(&symbol, self.config.timeframe, &self.config.lookback_range)
            .await
        {
            Ok(level) => level,
            Err(e) => {
                warn!("{} unavailable: {:#}", symbol, e);
                None
            }
        }
    }

    fn run_forecast(&self, closes: &[f64]) -> ForecastStatus {
        let Some(forecaster) = &self.forecaster else {
            return ForecastStatus::Disabled;
        };
        match forecaster.forecast(closes, self.config.forecast.steps) {
            Ok(f) => ForecastStatus::Available(f),
            Err(e) => {
                warn!("Forecast unavailable: {}", e);
                ForecastStatus::Unavailable(e.to_string())
            }
        }
    }

    fn print_status(&self, report: &CycleReport, ledger: &TradeLedger) {
        let snap = &report.snapshot;
        let et = snap.timestamp.with_timezone(&Eastern);

        info!("{}", "=".repeat(60));
        info!(
            "{} {} | {}",
            self.config.symbol,
            self.config.timeframe,
            et.format("%Y-%m-%d %H:%M %Z")
        );
        let change = snap
            .prev_close
            .filter(|p| *p != 0.0)
            .map(|p| format!("{:+.3}%", (snap.close / p - 1.0) * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        info!("Close: {:.2} ({})", snap.close, change);
        info!(
            "EMA {}/{}: {} / {} | ATR: {}",
            self.config.indicators.fast_ema,
            self.config.indicators.slow_ema,
            fmt_opt(snap.fast_ema),
            fmt_opt(snap.slow_ema),
            fmt_opt(snap.atr)
        );
        info!(
            "RSI: {} | MACD hist: {} | Z: {}",
            fmt_opt(snap.rsi),
            fmt_opt(snap.macd.map(|m| m.histogram)),
            fmt_opt(snap.zscore)
        );
        if self.config.vix_symbol.is_some() {
            info!("VIX: {}", fmt_opt(report.vix));
        }
        if report.high_volatility(self.config.scorer.vix_elevated) {
            warn!(
                "High volatility: VIX {} above {}, bias dampened",
                fmt_opt(report.vix),
                fmt_opt(self.config.scorer.vix_elevated)
            );
        }
        match &report.forecast {
            ForecastStatus::Available(f) => {
                if let Some(p) = f.next() {
                    info!(
                        "Forecast ({}): {:.2} [{:.2}, {:.2}]",
                        f.model, p.mean, p.lower, p.upper
                    );
                }
            }
            ForecastStatus::Unavailable(reason) => info!("Forecast: unavailable ({})", reason),
            ForecastStatus::Disabled => {}
        }

        let d = &report.decision;
        match d.score {
            Some(score) => info!("Signal: {} | confidence {} | score {:+}", d.label, d.confidence, score),
            None => info!("Signal: {} | confidence {}", d.label, d.confidence),
        }
        for gate in &d.gates {
            warn!("Gate: {}", gate);
        }
        if let Some(lv) = &d.levels {
            info!(
                "Entry: {:.2} | Target: {:.2} | Invalidation: {:.2} | R:R {:.2}",
                lv.entry,
                lv.target,
                lv.invalidation,
                lv.reward_risk()
            );
        }

        if let Some(open) = ledger.open_trade() {
            info!(
                "Open #{}: {} from {:.2} | unrealized {:+.2}",
                open.id,
                open.direction,
                open.entry_price,
                open.unrealized(snap.close)
            );
        }
        if ledger.is_enabled() {
            let stats = ledger.stats();
            info!(
                "Trades: {} | Open: {} | Win Rate: {}% | PnL: {:+.2}",
                stats.total_trades, stats.open_trades, stats.win_rate, stats.total_pnl
            );
        }
        info!("{}", "=".repeat(60));
    }

    /// Repeat cycles with a fixed sleep until Ctrl-C.
    pub async fn run(&mut self, ledger: &mut TradeLedger) -> Result<()> {
        info!("Monitor is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.shutdown(ledger, Utc::now());
                    return Ok(());
                }
                _ = self.tick(ledger) => {}
            }
        }
    }

    async fn tick(&mut self, ledger: &mut TradeLedger) {
        match self.run_cycle(ledger).await {
            CycleOutcome::Scored(report) => {
                debug!(label = %report.decision.label, "cycle scored");
            }
            CycleOutcome::InsufficientData(_) | CycleOutcome::Unavailable(_) => {
                debug!("cycle skipped");
            }
        }
        tokio::time::sleep(Duration::from_secs(self.config.refresh_secs)).await;
    }

    /// Close any open paper trade at the last seen price.
    pub fn shutdown(&mut self, ledger: &mut TradeLedger, at: DateTime<Utc>) -> Vec<TradeRecord> {
        info!("Shutting down...");
        let closed = match self.last_price {
            Some(price) => ledger.close_all(price, at),
            None => Vec::new(),
        };
        let stats = ledger.stats();
        info!(
            "Trades: {} | Win Rate: {}% | PnL: {:+.2} | Best: {:+.2} | Worst: {:+.2}",
            stats.total_trades, stats.win_rate, stats.total_pnl, stats.best_trade, stats.worst_trade
        );
        info!("Monitor stopped after {} cycles.", self.cycles);
        closed
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x))
        .unwrap_or_else(|| "n/a".to_string())
}
