/*
Exponential Smoothing (Holt's linear method)
Tracks a smoothed level and a smoothed trend, weighting recent periods more heavily than a
plain regression does.

How it works: level and trend start from the first two points and are updated once per
period. Each update first records the one-step-ahead error, which drives both the band
(1.5x their standard deviation) and the confidence (1 - mean absolute error / mean level).
The forecast is level + k * trend for each future step k.
*/

use super::{is_silent, Estimator, ForecastError, MethodParameters};
use crate::models::ensure_horizon;
use crate::types::{ForecastResult, MethodKind};
use crate::utils::{mean, std_dev};

#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    pub alpha: f64,
    pub beta: f64,
    pub band_multiplier: f64,
}

struct Smoothed {
    level: f64,
    trend: f64,
    errors: Vec<f64>,
}

impl ExponentialSmoothing {
    fn smooth(&self, series: &[f64]) -> Smoothed {
        let alpha = self.alpha.clamp(0.0, 1.0);
        let beta = self.beta.clamp(0.0, 1.0);

        let mut level = series[0];
        let mut trend = series[1] - series[0];
        let mut errors = Vec::with_capacity(series.len() - 1);

        for value in &series[1..] {
            let predicted = level + trend;
            errors.push(value - predicted);

            let next_level = alpha * value + (1.0 - alpha) * predicted;
            trend = beta * (next_level - level) + (1.0 - beta) * trend;
            level = next_level;
        }

        Smoothed {
            level,
            trend,
            errors,
        }
    }
}

impl Estimator for ExponentialSmoothing {
    fn kind(&self) -> MethodKind {
        MethodKind::ExponentialSmoothing
    }

    fn min_points(&self) -> usize {
        2
    }

    fn requires_numeric(&self) -> bool {
        true
    }

    fn parameters(&self) -> MethodParameters {
        MethodParameters::ExponentialSmoothing {
            alpha: self.alpha,
            beta: self.beta,
            band_multiplier: self.band_multiplier,
        }
    }

    fn fit_and_forecast(
        &self,
        series: &[f64],
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        ensure_horizon(horizon)?;

        if series.len() < self.min_points() {
            return Err(ForecastError::degenerate_input(format!(
                "ExponentialSmoothing model requires at least {} points, got {}",
                self.min_points(),
                series.len()
            )));
        }

        if is_silent(series) {
            return Ok(ForecastResult::zero(self.kind(), horizon));
        }

        let Smoothed {
            level,
            trend,
            errors,
        } = self.smooth(series);

        let spread = if errors.len() < 2 {
            std_dev(series)
        } else {
            std_dev(&errors)
        };

        let average = mean(series);
        let mean_abs_error = errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64;
        let confidence = if average <= 0.0 {
            0.0
        } else {
            (1.0 - mean_abs_error / average) * 100.0
        };

        let projections: Vec<f64> = (1..=horizon)
            .map(|step| level + trend * step as f64)
            .collect();

        Ok(ForecastResult::from_projection(
            self.kind(),
            &projections,
            spread * self.band_multiplier,
            confidence,
        ))
    }
}
