use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::models::{Direction, TradeStatus};
use crate::strategies::Decision;
use crate::trading::trade_record::{TradeExit, TradeRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_trades: usize,
    pub open_trades: usize,
    /// Percent of closed trades with positive pnl.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}

/// Session-scoped paper-trade ledger. Owned by the caller and lent to each
/// refresh cycle; records are appended and closed, never removed.
pub struct TradeLedger {
    records: Vec<TradeRecord>,
    trade_counter: u64,
    enabled: bool,
    quantity: f64,
    /// Trading fees as fraction (e.g., 0.001 = 0.1%)
    fee_rate: f64,
    /// Slippage as fraction (e.g., 0.0005 = 0.05%)
    slippage_rate: f64,
}

impl TradeLedger {
    pub fn new(cfg: &Config) -> Self {
        Self {
            records: Vec::new(),
            trade_counter: 0,
            enabled: cfg.paper_trade,
            quantity: cfg.paper_quantity,
            fee_rate: cfg.fee_rate,
            slippage_rate: cfg.slippage_rate,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn open_trade(&self) -> Option<&TradeRecord> {
        self.records.iter().find(|r| r.is_open())
    }

    /// Open a trade from `decision` if it carries price levels and nothing
    /// is already open.
    pub fn open(&mut self, decision: &Decision, at: DateTime<Utc>) -> Option<&TradeRecord> {
        if !self.enabled || self.open_trade().is_some() {
            return None;
        }
        let levels = decision.levels.as_ref()?;
        if levels.risk() <= 0.0 || self.quantity <= 0.0 {
            return None;
        }

        // Slippage fills against us
        let entry_price = match levels.direction {
            Direction::Long => levels.entry * (1.0 + self.slippage_rate),
            Direction::Short => levels.entry * (1.0 - self.slippage_rate),
        };
        let entry_fee = entry_price * self.quantity * self.fee_rate;

        self.trade_counter += 1;
        let record = TradeRecord {
            id: self.trade_counter,
            direction: levels.direction,
            label: decision.label,
            entry_price,
            target: levels.target,
            stop: levels.invalidation,
            quantity: self.quantity,
            entry_time: at,
            entry_fee,
            exit: None,
            status: TradeStatus::Open,
            pnl: 0.0,
        };

        info!(
            id = record.id,
            direction = %record.direction,
            entry = record.entry_price,
            target = record.target,
            stop = record.stop,
            "paper trade opened"
        );
        self.records.push(record);
        self.records.last()
    }

    /// Close any open trade whose stop or target `price` has reached.
    /// The stop is checked first and fills happen at the level price.
    pub fn close_out(&mut self, price: f64, at: DateTime<Utc>) -> Vec<TradeRecord> {
        let mut closed = Vec::new();
        for i in 0..self.records.len() {
            let rec = &self.records[i];
            if !rec.is_open() {
                continue;
            }
            let exit = if rec.stop_hit(price) {
                Some((rec.stop, TradeStatus::ClosedStop))
            } else if rec.target_hit(price) {
                Some((rec.target, TradeStatus::ClosedTarget))
            } else {
                None
            };
            if let Some((exit_price, status)) = exit {
                closed.push(self.close_record(i, exit_price, at, status));
            }
        }
        closed
    }

    /// Close everything still open at `price`.
    pub fn close_all(&mut self, price: f64, at: DateTime<Utc>) -> Vec<TradeRecord> {
        let open: Vec<usize> = (0..self.records.len())
            .filter(|&i| self.records[i].is_open())
            .collect();
        open.into_iter()
            .map(|i| self.close_record(i, price, at, TradeStatus::ClosedManual))
            .collect()
    }

    fn close_record(
        &mut self,
        idx: usize,
        exit_price: f64,
        at: DateTime<Utc>,
        status: TradeStatus,
    ) -> TradeRecord {
        let fee_rate = self.fee_rate;
        let rec = &mut self.records[idx];

        let exit_fee = exit_price * rec.quantity * fee_rate;
        let gross = rec.direction.sign() * (exit_price - rec.entry_price) * rec.quantity;
        rec.pnl = round2(gross - rec.entry_fee - exit_fee);
        rec.status = status;
        rec.exit = Some(TradeExit {
            price: exit_price,
            time: at,
            status,
        });

        info!(id = rec.id, status = %status, exit = exit_price, pnl = rec.pnl, "paper trade closed");
        rec.clone()
    }

    pub fn stats(&self) -> LedgerStats {
        let open_trades = self.records.iter().filter(|r| r.is_open()).count();
        let closed: Vec<f64> = self
            .records
            .iter()
            .filter(|r| !r.is_open())
            .map(|r| r.pnl)
            .collect();

        if closed.is_empty() {
            return LedgerStats {
                open_trades,
                ..Default::default()
            };
        }

        let wins: Vec<f64> = closed.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = closed.iter().copied().filter(|p| *p <= 0.0).collect();
        let mean = |v: &[f64]| {
            if v.is_empty() {
                0.0
            } else {
                round2(v.iter().sum::<f64>() / v.len() as f64)
            }
        };

        LedgerStats {
            total_trades: closed.len(),
            open_trades,
            win_rate: round1(wins.len() as f64 / closed.len() as f64 * 100.0),
            total_pnl: round2(closed.iter().sum()),
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            best_trade: round2(closed.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            worst_trade: round2(closed.iter().copied().fold(f64::INFINITY, f64::min)),
        }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
