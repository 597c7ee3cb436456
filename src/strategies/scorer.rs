use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::signals::{Decision, GateReason, PriceLevels, SignalLabel};
use crate::config::ScorerConfig;
use crate::indicators::IndicatorSnapshot;
use crate::models::Direction;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignalError {
    #[error("insufficient data after {bars} bars: {} undefined", .missing.join(", "))]
    InsufficientData {
        bars: usize,
        missing: Vec<&'static str>,
    },
}

/// Everything the scorer reads. All fields are defined values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub close: f64,
    pub prev_close: f64,
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub atr: f64,
    pub macd_histogram: Option<f64>,
    pub vix: Option<f64>,
    pub forecast_next: Option<f64>,
}

impl ScoreInputs {
    /// Fails when any input the configuration needs is still undefined.
    pub fn from_snapshot(
        snap: &IndicatorSnapshot,
        vix: Option<f64>,
        forecast_next: Option<f64>,
        cfg: &ScorerConfig,
    ) -> Result<Self, SignalError> {
        let missing = snap.missing(cfg.use_macd);
        let (Some(prev_close), Some(fast_ema), Some(slow_ema), Some(atr), true) = (
            snap.prev_close,
            snap.fast_ema,
            snap.slow_ema,
            snap.atr,
            missing.is_empty(),
        ) else {
            return Err(SignalError::InsufficientData {
                bars: snap.bars,
                missing,
            });
        };

        Ok(Self {
            close: snap.close,
            prev_close,
            fast_ema,
            slow_ema,
            atr,
            macd_histogram: snap.macd.map(|m| m.histogram),
            vix,
            forecast_next,
        })
    }

    pub fn one_step_return(&self) -> f64 {
        if self.prev_close == 0.0 {
            return 0.0;
        }
        self.close / self.prev_close - 1.0
    }

    pub fn atr_ratio(&self) -> f64 {
        if self.close == 0.0 {
            return f64::INFINITY;
        }
        self.atr / self.close
    }
}

fn vote(a: f64, b: f64) -> i32 {
    if a > b {
        1
    } else if a < b {
        -1
    } else {
        0
    }
}

/// Rule-based bias scorer. Stateless; `evaluate` is a pure function of its
/// inputs and the configuration it was built with.
#[derive(Debug, Clone)]
pub struct SignalScorer {
    cfg: ScorerConfig,
}

impl SignalScorer {
    pub fn new(cfg: ScorerConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.cfg
    }

    pub fn evaluate(&self, inputs: &ScoreInputs) -> Decision {
        let gates = self.gates(inputs);
        if !gates.is_empty() {
            return Decision::gated(gates);
        }

        let score = self.score(inputs);
        let label = self.label_for(score);
        let levels = label
            .direction()
            .map(|dir| self.price_levels(dir, inputs.close, inputs.atr));

        Decision {
            label,
            confidence: label.confidence(),
            score: Some(score),
            levels,
            gates,
        }
    }

    /// Every precondition that blocks scoring for these inputs.
    pub fn gates(&self, inputs: &ScoreInputs) -> Vec<GateReason> {
        let mut out = Vec::new();

        if let Some(limit) = self.cfg.max_atr_ratio {
            let atr_ratio = inputs.atr_ratio();
            if atr_ratio > limit {
                out.push(GateReason::VolatilityTooHigh { atr_ratio, limit });
            }
        }

        if let Some(epsilon) = self.cfg.min_abs_return {
            let abs_return = inputs.one_step_return().abs();
            if abs_return < epsilon {
                out.push(GateReason::NoMomentum {
                    abs_return,
                    epsilon,
                });
            }
        }

        if let (Some(limit), Some(level)) = (self.cfg.vix_extreme, inputs.vix) {
            if level > limit {
                out.push(GateReason::VixExtreme { level, limit });
            }
        }

        out
    }

    pub fn score(&self, inputs: &ScoreInputs) -> i32 {
        let mut score = vote(inputs.fast_ema, inputs.slow_ema);
        score += vote(inputs.close, inputs.prev_close);

        if self.cfg.use_macd {
            if let Some(hist) = inputs.macd_histogram {
                score += vote(hist, 0.0);
            }
        }

        if self.cfg.use_forecast {
            if let Some(next) = inputs.forecast_next {
                score += vote(next, inputs.close);
            }
        }

        // Elevated volatility pulls the score one step toward neutral.
        if let (Some(limit), Some(level)) = (self.cfg.vix_elevated, inputs.vix) {
            if level > limit {
                score -= score.signum();
            }
        }

        score
    }

    pub fn label_for(&self, score: i32) -> SignalLabel {
        let cut = self.cfg.cutoffs;
        if score >= cut.strong {
            SignalLabel::Long
        } else if score >= cut.mild {
            SignalLabel::LongCautious
        } else if score <= -cut.strong {
            SignalLabel::Short
        } else if score <= -cut.mild {
            SignalLabel::ShortCautious
        } else {
            SignalLabel::Neutral
        }
    }

    pub fn price_levels(&self, direction: Direction, entry: f64, atr: f64) -> PriceLevels {
        let step = atr * self.cfg.risk_multiplier;
        let sign = direction.sign();
        PriceLevels {
            direction,
            entry,
            target: entry + sign * step,
            invalidation: entry - sign * step * self.cfg.stop_fraction,
        }
    }
}
