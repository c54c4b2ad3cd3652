use crate::types::{ForecastResult, MethodKind};
use serde::Serialize;

pub use errors::{ensure_horizon, ForecastError};
#[cfg(feature = "numeric")]
pub use exponential_smoothing::ExponentialSmoothing;
#[cfg(feature = "numeric")]
pub use linear_trend::LinearTrend;
pub use moving_median::MovingMedian;
pub use selector::{Diagnostic, ModelSelector, Selection};
pub use trimmed_mean::{SingleStep, TrimmedMean};

mod errors;
#[cfg(feature = "numeric")]
mod exponential_smoothing;
#[cfg(feature = "numeric")]
mod linear_trend;
mod moving_median;
mod selector;
mod trimmed_mean;

/// A single-signal forecaster over an ordered (oldest to newest) series.
pub trait Estimator: Send + Sync {
    fn kind(&self) -> MethodKind;

    /// Fewer points than this and the estimator declines with `DegenerateInput`.
    fn min_points(&self) -> usize;

    /// Whether the estimator is part of the regression family gated behind the
    /// `numeric` capability.
    fn requires_numeric(&self) -> bool {
        false
    }

    fn parameters(&self) -> MethodParameters;

    fn fit_and_forecast(&self, series: &[f64], horizon: usize)
        -> Result<ForecastResult, ForecastError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MethodParameters {
    LinearTrend { band_multiplier: f64 },
    ExponentialSmoothing { alpha: f64, beta: f64, band_multiplier: f64 },
    MovingMedian { window: usize, band_multiplier: f64 },
    TrimmedMean { window: usize, cap: u32 },
}

/// Which optional numeric machinery is usable in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub numeric: bool,
}

impl Capabilities {
    /// Detects what this build supports. Queried once when the selector is built.
    pub fn detect() -> Self {
        Self {
            numeric: cfg!(feature = "numeric"),
        }
    }

    /// Dependency-free estimators only.
    pub fn degraded() -> Self {
        Self { numeric: false }
    }
}

/// True when there is no signal at all (empty or all non-positive).
pub(crate) fn is_silent(series: &[f64]) -> bool {
    series.iter().all(|value| *value <= 0.0)
}
