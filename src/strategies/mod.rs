pub mod scorer;
pub mod signals;

pub use scorer::{ScoreInputs, SignalError, SignalScorer};
pub use signals::{Confidence, Decision, GateReason, PriceLevels, SignalLabel};
