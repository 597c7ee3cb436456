//! Trailing-window technical indicators.
//!
//! Every indicator returns `None` until its minimum window is filled.
//! Callers must treat `None` as undefined, never as zero.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod snapshot;
pub mod zscore;

pub use atr::{atr, AtrMethod};
pub use ema::{ema, ema_series};
pub use macd::{macd, MacdValue};
pub use rsi::rsi;
pub use snapshot::IndicatorSnapshot;
pub use zscore::zscore;
