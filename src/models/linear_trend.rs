/*
Linear Trend Regression
Fits a least-squares line to (index, value) pairs and extrapolates it over the horizon.

How it works: the slope and intercept are fitted over the whole series, the band is
1.5x the standard deviation of the fit residuals, and confidence is R² expressed as a
percentage. A flat non-zero series is a perfect fit. Needs at least two points.
*/

use super::{is_silent, Estimator, ForecastError, MethodParameters};
use crate::models::ensure_horizon;
use crate::types::{ForecastResult, MethodKind};
use crate::utils::{fit_line, r_squared, std_dev};

#[derive(Debug, Clone)]
pub struct LinearTrend {
    pub min_points: usize,
    pub band_multiplier: f64,
}

impl Estimator for LinearTrend {
    fn kind(&self) -> MethodKind {
        MethodKind::LinearTrend
    }

    fn min_points(&self) -> usize {
        self.min_points.max(2)
    }

    fn requires_numeric(&self) -> bool {
        true
    }

    fn parameters(&self) -> MethodParameters {
        MethodParameters::LinearTrend {
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
                "LinearTrend model requires at least {} points, got {}",
                self.min_points(),
                series.len()
            )));
        }

        if is_silent(series) {
            return Ok(ForecastResult::zero(self.kind(), horizon));
        }

        let fit = fit_line(series);

        let residuals: Vec<f64> = series
            .iter()
            .enumerate()
            .map(|(i, value)| value - fit.at(i as f64))
            .collect();

        let spread = if residuals.len() < 2 {
            std_dev(series)
        } else {
            std_dev(&residuals)
        };

        // No variance at all means the line passes through every point
        let confidence = r_squared(series, &fit).unwrap_or(1.0) * 100.0;

        let n = series.len();
        let projections: Vec<f64> = (0..horizon).map(|step| fit.at((n + step) as f64)).collect();

        Ok(ForecastResult::from_projection(
            self.kind(),
            &projections,
            spread * self.band_multiplier,
            confidence,
        ))
    }
}
