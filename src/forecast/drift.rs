use super::{Forecast, ForecastError, ForecastPoint, Forecaster};

/// Fewest closes that leave two log returns to fit.
pub const MIN_CLOSES: usize = 3;
/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.959964;

/// Random walk with drift on log prices.
///
/// Fits the mean and sample deviation of trailing log returns; the h-step
/// mean is `last * exp(mu * h)` and the band widens with `sqrt(h)`.
#[derive(Debug, Clone)]
pub struct DriftForecaster {
    window: usize,
}

impl DriftForecaster {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(MIN_CLOSES),
        }
    }
}

impl Forecaster for DriftForecaster {
    fn name(&self) -> &str {
        "drift"
    }

    fn forecast(&self, closes: &[f64], steps: usize) -> Result<Forecast, ForecastError> {
        if steps == 0 {
            return Err(ForecastError::NoSteps);
        }
        if closes.len() < MIN_CLOSES {
            return Err(ForecastError::TooShort {
                needed: MIN_CLOSES,
                got: closes.len(),
            });
        }

        let window = &closes[closes.len().saturating_sub(self.window)..];
        if window.iter().any(|c| !c.is_finite() || *c <= 0.0) {
            return Err(ForecastError::Degenerate);
        }

        let returns: Vec<f64> = window.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let n = returns.len() as f64;
        let mu = returns.iter().sum::<f64>() / n;
        let sigma = (returns.iter().map(|r| (r - mu).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        if !mu.is_finite() || !sigma.is_finite() {
            return Err(ForecastError::Degenerate);
        }

        let last = window[window.len() - 1];
        let points = (1..=steps)
            .map(|step| {
                let h = step as f64;
                let centre = mu * h;
                let half_width = Z_95 * sigma * h.sqrt();
                ForecastPoint {
                    step,
                    mean: last * centre.exp(),
                    lower: last * (centre - half_width).exp(),
                    upper: last * (centre + half_width).exp(),
                }
            })
            .collect();

        Ok(Forecast {
            model: self.name().to_string(),
            points,
        })
    }
}
