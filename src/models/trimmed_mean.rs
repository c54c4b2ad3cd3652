/*
Trimmed Mean (per-product single step)
Forecasts the next period for a single product from its most recent sale quantities.

How it works:
1. Spikes are only suppressed when the largest quantity exceeds both `spike_ratio` x the
   median and the fixed per-record cap. The effective cap is then the 95th percentile,
   interpolated when the numeric capability is present and nearest-rank otherwise.
2. The last `window` (capped) quantities are sorted and, with at least three of them,
   the single highest and lowest are dropped before averaging.
3. The trend label compares the first and last raw quantities of the lookback.

Confidence here is R² of a line through the capped quantities. When the line explains
nothing it falls back to a consistency score derived from the coefficient of variation
(bounded to 10..85).
*/

use super::{is_silent, Estimator, ForecastError, MethodParameters};
use crate::models::ensure_horizon;
use crate::types::{ForecastResult, MethodKind, Trend};
use crate::utils::{
    fit_line, mean, median, percentile_interpolated, percentile_nearest_rank, r_squared, sorted,
    std_dev,
};

#[derive(Debug, Clone)]
pub struct TrimmedMean {
    pub window: usize,
    pub cap: u32,
    pub spike_ratio: f64,
    pub spike_percentile: f64,
    pub band_multiplier: f64,
    /// Interpolated percentiles need the numeric capability
    pub numeric: bool,
}

/// One-step forecast with the trend label of the lookback.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleStep {
    pub result: ForecastResult,
    pub trend: Trend,
    /// Trimmed mean before rounding
    pub level: f64,
}

impl TrimmedMean {
    /// Caps spikes only when they are both extreme relative to the median and above the
    /// fixed cap. Returns the values untouched otherwise.
    pub fn suppress_spikes(&self, values: &[f64]) -> Vec<f64> {
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let mid = median(values);

        if values.is_empty() || max <= mid * self.spike_ratio || max <= self.cap as f64 {
            return values.to_vec();
        }

        let effective_cap = if self.numeric {
            percentile_interpolated(values, self.spike_percentile)
        } else {
            percentile_nearest_rank(values, self.spike_percentile)
        };

        values.iter().map(|v| v.min(effective_cap)).collect()
    }

    pub fn trimmed_mean(values: &[f64]) -> f64 {
        let sorted = sorted(values);

        if sorted.len() >= 3 {
            mean(&sorted[1..sorted.len() - 1])
        } else {
            mean(&sorted)
        }
    }

    fn confidence(values: &[f64]) -> f64 {
        if values.len() < 3 || is_silent(values) {
            return 0.0;
        }

        let fit = fit_line(values);
        if let Some(r2) = r_squared(values, &fit) {
            if r2 > 0.0 {
                return r2 * 100.0;
            }
        }

        let average = mean(values);
        if average <= 0.0 {
            return 0.0;
        }

        let variance = std_dev(values).powi(2);
        let coefficient_of_variation = variance / average.powi(2);

        (100.0 - coefficient_of_variation * 50.0).clamp(10.0, 85.0)
    }

    /// Forecasts the next period from raw quantities ordered oldest to newest.
    pub fn forecast_next(&self, quantities: &[f64]) -> SingleStep {
        let (first, last) = match (quantities.first(), quantities.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return SingleStep {
                    result: ForecastResult::zero(self.kind(), 1),
                    trend: Trend::Stable,
                    level: 0.0,
                }
            }
        };

        let trend = Trend::between(first, last);
        let capped = self.suppress_spikes(quantities);

        let window = self.window.max(1).min(capped.len());
        let recent = &capped[capped.len() - window..];
        let level = Self::trimmed_mean(recent);

        let result = ForecastResult::from_projection(
            self.kind(),
            &[level],
            std_dev(recent) * self.band_multiplier,
            Self::confidence(&capped),
        );

        SingleStep {
            result,
            trend,
            level,
        }
    }
}

impl Estimator for TrimmedMean {
    fn kind(&self) -> MethodKind {
        MethodKind::TrimmedMean
    }

    fn min_points(&self) -> usize {
        1
    }

    fn parameters(&self) -> MethodParameters {
        MethodParameters::TrimmedMean {
            window: self.window,
            cap: self.cap,
        }
    }

    /// Repeats the single-step level across the horizon.
    fn fit_and_forecast(
        &self,
        series: &[f64],
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        ensure_horizon(horizon)?;

        let step = self.forecast_next(series);
        let mut result = step.result;
        result.forecast = vec![result.forecast[0]; horizon];
        result.upper = vec![result.upper[0]; horizon];
        result.lower = vec![result.lower[0]; horizon];

        Ok(result)
    }
}
