use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Direction, TradeStatus};
use crate::strategies::SignalLabel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExit {
    pub price: f64,
    pub time: DateTime<Utc>,
    pub status: TradeStatus,
}

/// One paper trade, opened from a directional decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: u64,
    pub direction: Direction,
    pub label: SignalLabel,
    /// Fill price after slippage.
    pub entry_price: f64,
    pub target: f64,
    pub stop: f64,
    pub quantity: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_fee: f64,
    #[serde(default)]
    pub exit: Option<TradeExit>,
    pub status: TradeStatus,
    /// Net of fees. Zero while open.
    #[serde(default)]
    pub pnl: f64,
}

impl TradeRecord {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Whether `price` has reached the stop, on the losing side.
    pub fn stop_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop,
            Direction::Short => price >= self.stop,
        }
    }

    pub fn target_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price >= self.target,
            Direction::Short => price <= self.target,
        }
    }

    /// Mark-to-market pnl at `price`, before exit fees.
    pub fn unrealized(&self, price: f64) -> f64 {
        self.direction.sign() * (price - self.entry_price) * self.quantity - self.entry_fee
    }
}
