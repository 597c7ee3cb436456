use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::forecast::drift::MIN_CLOSES;
use crate::indicators::AtrMethod;
use crate::models::Timeframe;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),

    #[error("slow EMA ({slow}) must be longer than fast EMA ({fast})")]
    EmaOrder { fast: usize, slow: usize },

    #[error("MACD slow period ({slow}) must be longer than fast period ({fast})")]
    MacdOrder { fast: usize, slow: usize },

    #[error("stop fraction must lie strictly between 0 and 1, got {0}")]
    StopFraction(f64),

    #[error("risk multiplier must be positive, got {0}")]
    RiskMultiplier(f64),

    #[error("score cutoffs must satisfy strong > mild >= 1, got strong={strong} mild={mild}")]
    Cutoffs { strong: i32, mild: i32 },

    #[error("{name} must be positive, got {value}")]
    NonPositiveThreshold { name: &'static str, value: f64 },

    #[error("forecast window must cover at least {min} closes, got {window}")]
    ForecastWindow { window: usize, min: usize },

    #[error("VIX elevated level ({elevated}) must not exceed the extreme level ({extreme})")]
    VixOrder { elevated: f64, extreme: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub fast_ema: usize,
    pub slow_ema: usize,
    pub atr_period: usize,
    pub atr_method: AtrMethod,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub zscore_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_ema: 9,
            slow_ema: 21,
            atr_period: 14,
            atr_method: AtrMethod::HighLow,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            zscore_window: 20,
        }
    }
}

/// Score-to-label cut points. The mapping mirrors around zero, so only the
/// positive side is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCutoffs {
    /// Score at or above which the label is LONG (at or below the negation: SHORT).
    pub strong: i32,
    /// Score at or above which the label is LONG_CAUTIOUS.
    pub mild: i32,
}

impl LabelCutoffs {
    pub const TWO_INPUT: LabelCutoffs = LabelCutoffs { strong: 2, mild: 1 };
    pub const FOUR_INPUT: LabelCutoffs = LabelCutoffs { strong: 3, mild: 1 };

    pub fn for_inputs(inputs: usize) -> Self {
        if inputs <= 2 {
            Self::TWO_INPUT
        } else {
            Self::FOUR_INPUT
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Gate when ATR / close exceeds this fraction.
    pub max_atr_ratio: Option<f64>,
    /// Gate when |one-step return| is below this fraction.
    pub min_abs_return: Option<f64>,
    /// Gate when the volatility index exceeds this level.
    pub vix_extreme: Option<f64>,
    /// Dampen the score when the volatility index exceeds this level.
    pub vix_elevated: Option<f64>,
    pub use_macd: bool,
    pub use_forecast: bool,
    pub risk_multiplier: f64,
    pub stop_fraction: f64,
    pub cutoffs: LabelCutoffs,
}

impl ScorerConfig {
    /// Number of directional votes feeding the score.
    pub fn input_count(&self) -> usize {
        2 + usize::from(self.use_macd) + usize::from(self.use_forecast)
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            max_atr_ratio: Some(0.008),
            min_abs_return: Some(0.0003),
            vix_extreme: Some(30.0),
            vix_elevated: Some(25.0),
            use_macd: false,
            use_forecast: false,
            risk_multiplier: 1.0,
            stop_fraction: 0.75,
            cutoffs: LabelCutoffs::TWO_INPUT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub enabled: bool,
    /// Trailing closes fed to the forecaster.
    pub window: usize,
    pub steps: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: 60,
            steps: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Market
    pub symbol: String,
    pub vix_symbol: Option<String>,
    pub timeframe: Timeframe,
    pub lookback_range: String,
    pub refresh_secs: u64,
    /// How long fetched bars are reused before the provider is asked again.
    pub cache_ttl_secs: u64,

    pub indicators: IndicatorConfig,
    pub scorer: ScorerConfig,
    pub forecast: ForecastConfig,

    // Paper Trading
    pub paper_trade: bool,
    pub paper_quantity: f64,

    // Fees & Slippage (as fraction, e.g., 0.001 = 0.1%)
    pub fee_rate: f64,
    pub slippage_rate: f64,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for
    /// absent or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        // "off" / "none" disables a gate; anything unparsable keeps the default.
        let threshold = |key: &str, default: Option<f64>| -> Option<f64> {
            match lookup(key) {
                Some(v) if matches!(v.trim().to_lowercase().as_str(), "off" | "none" | "") => None,
                Some(v) => v.trim().parse().ok().or(default),
                None => default,
            }
        };

        let timeframe = Timeframe::from_str_loose(&env("TIMEFRAME", "15m")).unwrap_or(Timeframe::M15);

        let vix_symbol = env("VIX_SYMBOL", "^VIX");
        let vix_symbol = if vix_symbol.is_empty() || vix_symbol.eq_ignore_ascii_case("off") {
            None
        } else {
            Some(vix_symbol)
        };

        let defaults = IndicatorConfig::default();
        let indicators = IndicatorConfig {
            fast_ema: env("FAST_EMA", "9").parse().unwrap_or(defaults.fast_ema),
            slow_ema: env("SLOW_EMA", "21").parse().unwrap_or(defaults.slow_ema),
            atr_period: env("ATR_PERIOD", "14").parse().unwrap_or(defaults.atr_period),
            atr_method: AtrMethod::from_str_loose(&env("ATR_METHOD", "high_low"))
                .unwrap_or(defaults.atr_method),
            rsi_period: env("RSI_PERIOD", "14").parse().unwrap_or(defaults.rsi_period),
            zscore_window: env("ZSCORE_WINDOW", "20").parse().unwrap_or(defaults.zscore_window),
            ..defaults
        };

        let base = ScorerConfig::default();
        let use_macd = env("USE_MACD", "false").to_lowercase() == "true";
        let use_forecast = env("USE_FORECAST", "false").to_lowercase() == "true";
        let auto_cutoffs =
            LabelCutoffs::for_inputs(2 + usize::from(use_macd) + usize::from(use_forecast));
        let scorer = ScorerConfig {
            max_atr_ratio: threshold("MAX_ATR_RATIO", base.max_atr_ratio),
            min_abs_return: threshold("MIN_ABS_RETURN", base.min_abs_return),
            vix_extreme: threshold("VIX_EXTREME", base.vix_extreme),
            vix_elevated: threshold("VIX_ELEVATED", base.vix_elevated),
            use_macd,
            use_forecast,
            risk_multiplier: env("RISK_MULTIPLIER", "1.0").parse().unwrap_or(base.risk_multiplier),
            stop_fraction: env("STOP_FRACTION", "0.75").parse().unwrap_or(base.stop_fraction),
            cutoffs: LabelCutoffs {
                strong: env("SCORE_STRONG", "")
                    .parse()
                    .unwrap_or(auto_cutoffs.strong),
                mild: env("SCORE_MILD", "").parse().unwrap_or(auto_cutoffs.mild),
            },
        };

        let forecast = ForecastConfig {
            // The forecast vote needs a forecast to exist.
            enabled: use_forecast || env("FORECAST", "false").to_lowercase() == "true",
            window: env("FORECAST_WINDOW", "60").parse().unwrap_or(60),
            steps: env("FORECAST_STEPS", "5").parse().unwrap_or(5),
        };

        Config {
            symbol: env("SYMBOL", "^GSPC"),
            vix_symbol,
            lookback_range: env("LOOKBACK_RANGE", timeframe.default_range()),
            timeframe,
            refresh_secs: env("REFRESH_SECS", "300").parse().unwrap_or(300),
            cache_ttl_secs: env("CACHE_TTL_SECS", "300").parse().unwrap_or(300),
            indicators,
            scorer,
            forecast,
            paper_trade: env("PAPER_TRADE", "true").to_lowercase() == "true",
            paper_quantity: env("PAPER_QUANTITY", "1").parse().unwrap_or(1.0),
            fee_rate: env("FEE_RATE", "0").parse().unwrap_or(0.0),
            slippage_rate: env("SLIPPAGE_RATE", "0").parse().unwrap_or(0.0),
            log_level: env("LOG_LEVEL", "info"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        for (name, period) in [
            ("FAST_EMA", ind.fast_ema),
            ("SLOW_EMA", ind.slow_ema),
            ("ATR_PERIOD", ind.atr_period),
            ("RSI_PERIOD", ind.rsi_period),
            ("MACD_FAST", ind.macd_fast),
            ("MACD_SIGNAL", ind.macd_signal),
            ("FORECAST_STEPS", self.forecast.steps),
        ] {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }
        // a one-bar window has no sample deviation
        if ind.zscore_window < 2 {
            return Err(ConfigError::ZeroPeriod("ZSCORE_WINDOW"));
        }
        if self.forecast.window < MIN_CLOSES {
            return Err(ConfigError::ForecastWindow {
                window: self.forecast.window,
                min: MIN_CLOSES,
            });
        }
        if ind.slow_ema <= ind.fast_ema {
            return Err(ConfigError::EmaOrder {
                fast: ind.fast_ema,
                slow: ind.slow_ema,
            });
        }
        if ind.macd_slow <= ind.macd_fast {
            return Err(ConfigError::MacdOrder {
                fast: ind.macd_fast,
                slow: ind.macd_slow,
            });
        }

        let sc = &self.scorer;
        if !(sc.stop_fraction > 0.0 && sc.stop_fraction < 1.0) {
            return Err(ConfigError::StopFraction(sc.stop_fraction));
        }
        if !(sc.risk_multiplier > 0.0) {
            return Err(ConfigError::RiskMultiplier(sc.risk_multiplier));
        }
        if sc.cutoffs.mild < 1 || sc.cutoffs.strong <= sc.cutoffs.mild {
            return Err(ConfigError::Cutoffs {
                strong: sc.cutoffs.strong,
                mild: sc.cutoffs.mild,
            });
        }
        for (name, value) in [
            ("MAX_ATR_RATIO", sc.max_atr_ratio),
            ("MIN_ABS_RETURN", sc.min_abs_return),
            ("VIX_EXTREME", sc.vix_extreme),
            ("VIX_ELEVATED", sc.vix_elevated),
        ] {
            if let Some(v) = value {
                if !(v > 0.0) {
                    return Err(ConfigError::NonPositiveThreshold { name, value: v });
                }
            }
        }
        if let (Some(elevated), Some(extreme)) = (sc.vix_elevated, sc.vix_extreme) {
            if elevated > extreme {
                return Err(ConfigError::VixOrder { elevated, extreme });
            }
        }
        Ok(())
    }
}
