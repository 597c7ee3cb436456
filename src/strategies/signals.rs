use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Direction;

/// Directional bias, ordered from most bearish to most bullish.
/// `DoNotTrade` sits outside the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLabel {
    DoNotTrade,
    Short,
    ShortCautious,
    Neutral,
    LongCautious,
    Long,
}

impl SignalLabel {
    pub fn direction(self) -> Option<Direction> {
        match self {
            SignalLabel::Long | SignalLabel::LongCautious => Some(Direction::Long),
            SignalLabel::Short | SignalLabel::ShortCautious => Some(Direction::Short),
            SignalLabel::Neutral | SignalLabel::DoNotTrade => None,
        }
    }

    /// Position on the bearish..bullish scale, -2..=2.
    pub fn rank(self) -> Option<i8> {
        match self {
            SignalLabel::Short => Some(-2),
            SignalLabel::ShortCautious => Some(-1),
            SignalLabel::Neutral => Some(0),
            SignalLabel::LongCautious => Some(1),
            SignalLabel::Long => Some(2),
            SignalLabel::DoNotTrade => None,
        }
    }

    /// The same conviction on the other side of neutral.
    pub fn mirrored(self) -> SignalLabel {
        match self {
            SignalLabel::Long => SignalLabel::Short,
            SignalLabel::LongCautious => SignalLabel::ShortCautious,
            SignalLabel::Short => SignalLabel::Long,
            SignalLabel::ShortCautious => SignalLabel::LongCautious,
            other => other,
        }
    }

    pub fn confidence(self) -> Confidence {
        match self {
            SignalLabel::Long | SignalLabel::Short => Confidence::High,
            SignalLabel::LongCautious | SignalLabel::ShortCautious => Confidence::Medium,
            SignalLabel::Neutral => Confidence::None_,
            SignalLabel::DoNotTrade => Confidence::NotApplicable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::DoNotTrade => "DO_NOT_TRADE",
            SignalLabel::Short => "SHORT",
            SignalLabel::ShortCautious => "SHORT_CAUTIOUS",
            SignalLabel::Neutral => "NEUTRAL",
            SignalLabel::LongCautious => "LONG_CAUTIOUS",
            SignalLabel::Long => "LONG",
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    NotApplicable,
    #[serde(rename = "none")]
    None_,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::NotApplicable => write!(f, "n/a"),
            Confidence::None_ => write!(f, "none"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Why a bar was kept out of scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateReason {
    VolatilityTooHigh { atr_ratio: f64, limit: f64 },
    NoMomentum { abs_return: f64, epsilon: f64 },
    VixExtreme { level: f64, limit: f64 },
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateReason::VolatilityTooHigh { atr_ratio, limit } => {
                write!(f, "ATR/price {:.4} > {:.4}", atr_ratio, limit)
            }
            GateReason::NoMomentum { abs_return, epsilon } => {
                write!(f, "|return| {:.5} < {:.5}", abs_return, epsilon)
            }
            GateReason::VixExtreme { level, limit } => {
                write!(f, "VIX {:.2} > {:.2}", level, limit)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub direction: Direction,
    pub entry: f64,
    pub target: f64,
    pub invalidation: f64,
}

impl PriceLevels {
    pub fn reward(&self) -> f64 {
        (self.target - self.entry).abs()
    }

    pub fn risk(&self) -> f64 {
        (self.entry - self.invalidation).abs()
    }

    pub fn reward_risk(&self) -> f64 {
        if self.risk() == 0.0 {
            return 0.0;
        }
        self.reward() / self.risk()
    }
}

/// Scorer output for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub label: SignalLabel,
    pub confidence: Confidence,
    /// `None` when gated.
    pub score: Option<i32>,
    pub levels: Option<PriceLevels>,
    #[serde(default)]
    pub gates: Vec<GateReason>,
}

impl Decision {
    pub fn gated(gates: Vec<GateReason>) -> Self {
        Self {
            label: SignalLabel::DoNotTrade,
            confidence: Confidence::NotApplicable,
            score: None,
            levels: None,
            gates,
        }
    }

    pub fn is_gated(&self) -> bool {
        self.label == SignalLabel::DoNotTrade
    }
}
