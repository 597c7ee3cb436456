//! Short-horizon close-price forecasts.
//!
//! The forecast path is optional: a `ForecastError` is reported by the
//! monitor as "unavailable" and never stops a cycle.

pub mod drift;

pub use drift::DriftForecaster;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("need at least {needed} closes, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("non-positive or non-finite close in the fitting window")]
    Degenerate,

    #[error("forecast horizon must be at least one step")]
    NoSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Steps ahead of the last close, starting at 1.
    pub step: usize,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub model: String,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn next(&self) -> Option<&ForecastPoint> {
        self.points.first()
    }
}

pub trait Forecaster: Send + Sync {
    fn name(&self) -> &str;

    /// Point forecasts with confidence bounds for `steps` bars past the
    /// last element of `closes` (oldest first).
    fn forecast(&self, closes: &[f64], steps: usize) -> Result<Forecast, ForecastError>;
}
