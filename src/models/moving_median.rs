/*
Robust Moving Median
The universal fallback. Works from a single point and never fails on data.

How it works: the median of the last `window` points is the base level. A secondary
least-squares line over that same recent window gives the slope used to project forward
(base + slope * step, floored at 0). Confidence is 1 - (std dev of the window / median),
and 0 whenever the median is not positive.
*/

use super::{is_silent, Estimator, ForecastError, MethodParameters};
use crate::models::ensure_horizon;
use crate::types::{ForecastResult, MethodKind};
use crate::utils::{fit_line, median, std_dev};

#[derive(Debug, Clone)]
pub struct MovingMedian {
    pub window: usize,
    pub band_multiplier: f64,
}

impl MovingMedian {
    /// Infallible forecast. `horizon` is taken as given.
    pub fn forecast(&self, series: &[f64], horizon: usize) -> ForecastResult {
        if is_silent(series) {
            return ForecastResult::zero(self.kind(), horizon);
        }

        let window = self.window.max(1).min(series.len());
        let recent = &series[series.len() - window..];

        let base = median(recent);
        let slope = if recent.len() >= 2 {
            fit_line(recent).slope
        } else {
            0.0
        };

        let spread = std_dev(recent);
        let confidence = if base <= 0.0 {
            0.0
        } else {
            (1.0 - spread / base) * 100.0
        };

        let projections: Vec<f64> = (1..=horizon)
            .map(|step| (base + slope * step as f64).max(0.0))
            .collect();

        ForecastResult::from_projection(
            self.kind(),
            &projections,
            spread * self.band_multiplier,
            confidence,
        )
    }
}

impl Estimator for MovingMedian {
    fn kind(&self) -> MethodKind {
        MethodKind::MovingMedian
    }

    fn min_points(&self) -> usize {
        1
    }

    fn parameters(&self) -> MethodParameters {
        MethodParameters::MovingMedian {
            window: self.window,
            band_multiplier: self.band_multiplier,
        }
    }

    fn fit_and_forecast(
        &self,
        series: &[f64],
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        ensure_horizon(horizon)?;

        Ok(self.forecast(series, horizon))
    }
}
