mod common;

use anyhow::{bail, Result};
use async_trait::async_trait;

use index_bias::config::LabelCutoffs;
use index_bias::forecast::{DriftForecaster, Forecast, ForecastError, Forecaster};
use index_bias::market::{MarketData, ReplayFeed};
use index_bias::models::{CandleSeries, TradeStatus, Timeframe};
use index_bias::monitor::{CycleOutcome, ForecastStatus, Monitor};
use index_bias::strategies::{GateReason, SignalError, SignalLabel};
use index_bias::trading::TradeLedger;

use common::*;

/// A provider that is always down.
struct OfflineMarket;

#[async_trait]
impl MarketData for OfflineMarket {
    async fn fetch_bars(&mut self, symbol: &str, _tf: Timeframe, _range: &str) -> Result<CandleSeries> {
        bail!("connection refused for {}", symbol)
    }
}

/// A forecaster that never produces anything.
struct BrokenForecaster;

impl Forecaster for BrokenForecaster {
    fn name(&self) -> &str {
        "broken"
    }

    fn forecast(&self, _closes: &[f64], _steps: usize) -> Result<Forecast, ForecastError> {
        Err(ForecastError::Degenerate)
    }
}

fn scored(outcome: CycleOutcome) -> Box<index_bias::monitor::CycleReport> {
    match outcome {
        CycleOutcome::Scored(report) => report,
        other => panic!("expected a scored cycle, got {:?}", other),
    }
}

#[tokio::test]
async fn provider_failure_skips_the_cycle() {
    let cfg = test_config();
    let mut ledger = TradeLedger::new(&cfg);
    let mut monitor = Monitor::new(cfg, OfflineMarket, None);

    let outcome = monitor.run_cycle(&mut ledger).await;
    match outcome {
        CycleOutcome::Unavailable(reason) => assert!(reason.contains("connection refused")),
        other => panic!("unexpected outcome: {:?}", other),
    }
    // the next interval simply tries again
    assert!(matches!(
        monitor.run_cycle(&mut ledger).await,
        CycleOutcome::Unavailable(_)
    ));
    assert_eq!(monitor.cycles(), 2);
    assert!(ledger.records().is_empty());
}

#[tokio::test]
async fn warm_up_reports_missing_indicators() {
    let cfg = test_config();
    let mut ledger = TradeLedger::new(&cfg);
    let bars = make_closes(&rising(15, 100.0, 0.1));
    let mut monitor = Monitor::new(cfg, feed_at_end(&bars), None);

    match monitor.run_cycle(&mut ledger).await {
        CycleOutcome::InsufficientData(SignalError::InsufficientData { bars, missing }) => {
            assert_eq!(bars, 15);
            assert_eq!(missing, vec!["slow_ema"]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn steady_rise_scores_long_and_opens_a_trade() {
    let cfg = test_config();
    let mut ledger = TradeLedger::new(&cfg);
    let bars = make_closes(&rising(40, 100.0, 0.1));
    let mut monitor = Monitor::new(cfg, feed_at_end(&bars), None);

    let report = scored(monitor.run_cycle(&mut ledger).await);
    assert_eq!(report.decision.label, SignalLabel::Long);
    assert_eq!(report.decision.score, Some(2));
    assert_eq!(report.forecast, ForecastStatus::Disabled);

    let levels = report.decision.levels.unwrap();
    assert!(levels.target > levels.entry);
    assert!(levels.invalidation < levels.entry);
    assert!(levels.reward() > levels.risk());

    let opened = report.opened.expect("trade should open");
    assert_eq!(opened.status, TradeStatus::Open);
    assert!((opened.entry_price - levels.entry).abs() < 1e-9);
}

#[tokio::test]
async fn forecast_failure_is_isolated() {
    let mut cfg = test_config();
    cfg.scorer.use_forecast = true;
    cfg.scorer.cutoffs = LabelCutoffs::for_inputs(cfg.scorer.input_count());
    cfg.forecast.enabled = true;
    let mut ledger = TradeLedger::new(&cfg);
    let bars = make_closes(&rising(40, 100.0, 0.1));
    let mut monitor = Monitor::new(cfg, feed_at_end(&bars), Some(Box::new(BrokenForecaster)));

    let report = scored(monitor.run_cycle(&mut ledger).await);
    assert!(matches!(report.forecast, ForecastStatus::Unavailable(_)));
    // EMA and return still vote; the missing forecast votes nothing
    assert_eq!(report.decision.score, Some(2));
    assert_eq!(report.decision.label, SignalLabel::LongCautious);
}

#[tokio::test]
async fn drift_forecast_adds_a_vote() {
    let mut cfg = test_config();
    cfg.scorer.use_forecast = true;
    cfg.scorer.cutoffs = LabelCutoffs::for_inputs(cfg.scorer.input_count());
    cfg.forecast.enabled = true;
    cfg.forecast.window = 30;
    let mut ledger = TradeLedger::new(&cfg);
    let bars = make_closes(&rising(40, 100.0, 0.1));
    let forecaster = DriftForecaster::new(cfg.forecast.window);
    let mut monitor = Monitor::new(cfg, feed_at_end(&bars), Some(Box::new(forecaster)));

    let report = scored(monitor.run_cycle(&mut ledger).await);
    let next = report.forecast.next_mean().expect("forecast available");
    assert!(next > report.snapshot.close);
    assert_eq!(report.decision.score, Some(3));
    assert_eq!(report.decision.label, SignalLabel::Long);
}

#[tokio::test]
async fn extreme_vix_gates_and_elevated_vix_dampens() {
    let bars = make_closes(&rising(40, 100.0, 0.1));

    let mut cfg = test_config();
    cfg.vix_symbol = Some(VIX.to_string());

    let mut feed = feed_at_end(&bars);
    feed.load(VIX, vix_at(&bars, 35.0));
    let mut ledger = TradeLedger::new(&cfg);
    let mut monitor = Monitor::new(cfg.clone(), feed, None);
    let report = scored(monitor.run_cycle(&mut ledger).await);
    assert_eq!(report.vix, Some(35.0));
    assert_eq!(report.decision.label, SignalLabel::DoNotTrade);
    assert!(report.decision.levels.is_none());
    assert!(matches!(
        report.decision.gates.as_slice(),
        [GateReason::VixExtreme { .. }]
    ));
    assert!(ledger.records().is_empty());

    let mut feed = feed_at_end(&bars);
    feed.load(VIX, vix_at(&bars, 27.0));
    let mut ledger = TradeLedger::new(&cfg);
    let mut monitor = Monitor::new(cfg, feed, None);
    let report = scored(monitor.run_cycle(&mut ledger).await);
    assert_eq!(report.decision.score, Some(1));
    assert_eq!(report.decision.label, SignalLabel::LongCautious);
}

#[tokio::test]
async fn replay_walk_keeps_one_trade_open_at_a_time() {
    let cfg = test_config();
    let mut ledger = TradeLedger::new(&cfg);
    let bars = make_closes(&rise_then_fall(60, 60, 100.0, 0.1));
    let timestamps: Vec<_> = bars.iter().map(|c| c.timestamp).collect();

    let mut feed = ReplayFeed::new(500);
    feed.load(SYMBOL, bars.as_slice().to_vec());
    let mut monitor = Monitor::new(cfg, feed, None);

    let mut labels = Vec::new();
    let mut seen_records = 0;
    for ts in &timestamps {
        monitor.market_mut().set_time(*ts);
        if let CycleOutcome::Scored(report) = monitor.run_cycle(&mut ledger).await {
            labels.push(report.decision.label);
        }
        let open = ledger.records().iter().filter(|r| r.is_open()).count();
        assert!(open <= 1);
        // records are only ever appended
        assert!(ledger.records().len() >= seen_records);
        seen_records = ledger.records().len();
    }

    assert!(labels.contains(&SignalLabel::Long));
    assert!(labels.contains(&SignalLabel::Short));
    assert!(ledger.records().len() > 1);

    for rec in ledger.records().iter().filter(|r| !r.is_open()) {
        let exit = rec.exit.as_ref().unwrap();
        match rec.status {
            TradeStatus::ClosedTarget => {
                assert!((exit.price - rec.target).abs() < 1e-9);
                assert!(rec.pnl > 0.0);
            }
            TradeStatus::ClosedStop => {
                assert!((exit.price - rec.stop).abs() < 1e-9);
                assert!(rec.pnl < 0.0);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    let last = *timestamps.last().unwrap();
    monitor.shutdown(&mut ledger, last);
    assert!(ledger.open_trade().is_none());
    let stats = ledger.stats();
    assert_eq!(stats.total_trades, ledger.records().len());
    assert_eq!(stats.open_trades, 0);
}
