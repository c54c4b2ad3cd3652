use super::{Capabilities, Estimator, ForecastError, MethodParameters, MovingMedian, TrimmedMean};
#[cfg(feature = "numeric")]
use super::{ExponentialSmoothing, LinearTrend};
use crate::config::ForecastConfig;
use crate::models::ensure_horizon;
use crate::types::{ForecastResult, MethodKind};
use serde::Serialize;
use tracing::debug;

/// Errors closer than this are treated as a tie.
const TIE_TOLERANCE: f64 = 1e-9;

/// Backtest outcome of one estimator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub method: MethodKind,
    /// Error on the held-out points, `None` when the estimator could not be backtested
    pub error: Option<f64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub method: MethodKind,
    pub parameters: MethodParameters,
    /// Number of trailing points held out for the backtest
    pub holdout: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Selection {
    pub fn error_of(&self, method: MethodKind) -> Option<f64> {
        self.diagnostics
            .iter()
            .find(|diagnostic| diagnostic.method == method)
            .and_then(|diagnostic| diagnostic.error)
    }
}

/// Picks the estimator with the lowest backtest error.
///
/// Candidates are ordered by preference (regression family first, the moving median last)
/// and ties go to the earlier candidate, so the flat fallback only wins when it is strictly
/// better.
pub struct ModelSelector {
    config: ForecastConfig,
    candidates: Vec<Box<dyn Estimator>>,
    fallback: MovingMedian,
    single_step: TrimmedMean,
}

impl ModelSelector {
    pub fn new(config: ForecastConfig, capabilities: Capabilities) -> Self {
        let fallback = MovingMedian {
            window: config.window,
            band_multiplier: config.band_multiplier,
        };

        let single_step = TrimmedMean {
            window: config.window,
            cap: config.max_units_per_record,
            spike_ratio: config.spike_ratio,
            spike_percentile: config.spike_percentile,
            band_multiplier: config.band_multiplier,
            numeric: capabilities.numeric,
        };

        let mut candidates: Vec<Box<dyn Estimator>> = Vec::new();

        #[cfg(feature = "numeric")]
        {
            candidates.push(Box::new(LinearTrend {
                min_points: config.min_regression_points,
                band_multiplier: config.band_multiplier,
            }));
            candidates.push(Box::new(ExponentialSmoothing {
                alpha: config.smoothing_alpha,
                beta: config.smoothing_beta,
                band_multiplier: config.band_multiplier,
            }));
        }

        candidates.retain(|candidate| capabilities.numeric || !candidate.requires_numeric());
        candidates.push(Box::new(fallback.clone()));

        debug!(
            "Model selector ready with {:?}",
            candidates.iter().map(|c| c.kind()).collect::<Vec<_>>()
        );

        Self {
            config,
            candidates,
            fallback,
            single_step,
        }
    }

    pub fn single_step(&self) -> &TrimmedMean {
        &self.single_step
    }

    fn estimator(&self, method: MethodKind) -> Option<&dyn Estimator> {
        if method == MethodKind::TrimmedMean {
            return Some(&self.single_step);
        }

        self.candidates
            .iter()
            .find(|candidate| candidate.kind() == method)
            .map(|candidate| &**candidate)
    }

    /// Backtests every available candidate against the last `holdout` points and picks
    /// the best. Never fails: with nothing to backtest it picks the most preferred
    /// candidate that can at least fit the series, else the moving median.
    pub fn select_best(&self, series: &[f64], horizon: usize) -> Selection {
        let holdout = self.config.backtest_holdout.min(series.len() / 2);
        let mut diagnostics = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            diagnostics.push(self.backtest(&**candidate, series, holdout));
        }

        let best = diagnostics
            .iter()
            .filter_map(|diagnostic| diagnostic.error.map(|error| (diagnostic.method, error)))
            .fold(None, |best: Option<(MethodKind, f64)>, (method, error)| match best {
                Some((_, best_error)) if error >= best_error - TIE_TOLERANCE => best,
                _ => Some((method, error)),
            })
            .map(|(method, _)| method);

        let method = best.unwrap_or_else(|| {
            self.candidates
                .iter()
                .find(|candidate| series.len() >= candidate.min_points())
                .map(|candidate| candidate.kind())
                .unwrap_or(MethodKind::MovingMedian)
        });

        let parameters = self
            .estimator(method)
            .map(|estimator| estimator.parameters())
            .unwrap_or_else(|| self.fallback.parameters());

        debug!(
            "Selected {} for {} points (horizon {}, holdout {})",
            method,
            series.len(),
            horizon,
            holdout
        );

        Selection {
            method,
            parameters,
            holdout,
            diagnostics,
        }
    }

    fn backtest(&self, estimator: &dyn Estimator, series: &[f64], holdout: usize) -> Diagnostic {
        let method = estimator.kind();

        if holdout == 0 {
            return Diagnostic {
                method,
                error: None,
                note: Some("series too short to hold out points".to_string()),
            };
        }

        let (train, actual) = series.split_at(series.len() - holdout);

        if train.len() < estimator.min_points() {
            return Diagnostic {
                method,
                error: None,
                note: Some(format!(
                    "needs {} training points, has {}",
                    estimator.min_points(),
                    train.len()
                )),
            };
        }

        match estimator.fit_and_forecast(train, holdout) {
            Ok(result) => Diagnostic {
                method,
                error: Some(forecast_error(&result.forecast, actual)),
                note: None,
            },
            Err(e) => Diagnostic {
                method,
                error: None,
                note: Some(e.to_string()),
            },
        }
    }

    /// Runs exactly `method`. A method left out of this build or process is
    /// `DependencyUnavailable`, a series it cannot fit is `DegenerateInput`.
    pub fn forecast_with(
        &self,
        method: MethodKind,
        series: &[f64],
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        ensure_horizon(horizon)?;

        let estimator = self.estimator(method).ok_or_else(|| {
            ForecastError::dependency_unavailable(format!(
                "{} needs the numeric estimators",
                method
            ))
        })?;

        estimator.fit_and_forecast(series, horizon)
    }

    /// Forecasts `horizon` periods with the hinted method when it is available, otherwise
    /// with the backtest winner. Data problems fall back to the moving median; only a
    /// zero horizon is an error.
    pub fn forecast(
        &self,
        series: &[f64],
        horizon: usize,
        method_hint: Option<MethodKind>,
    ) -> Result<ForecastResult, ForecastError> {
        ensure_horizon(horizon)?;

        let method = match method_hint {
            Some(hint) => match self.forecast_with(hint, series, horizon) {
                Ok(result) => return Ok(result),
                Err(ForecastError::DependencyUnavailable { message }) => {
                    debug!("{}, selecting instead", message);
                    self.select_best(series, horizon).method
                }
                Err(e) => return self.recover(hint, e, series, horizon),
            },
            None => self.select_best(series, horizon).method,
        };

        match self.forecast_with(method, series, horizon) {
            Ok(result) => Ok(result),
            Err(e) => self.recover(method, e, series, horizon),
        }
    }

    fn recover(
        &self,
        method: MethodKind,
        error: ForecastError,
        series: &[f64],
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        if let ForecastError::InvalidParameter { .. } = error {
            return Err(error);
        }

        debug!("{} declined ({}), using moving median", method, error);
        Ok(self.fallback.forecast(series, horizon))
    }
}

/// Mean absolute percentage error over the held-out points that sold something.
/// When every held-out actual is zero the percentage is undefined and the mean
/// absolute error is used instead.
pub fn forecast_error(forecast: &[u64], actual: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = forecast
        .iter()
        .zip(actual)
        .map(|(predicted, actual)| (*predicted as f64, *actual))
        .collect();

    if pairs.is_empty() {
        return 0.0;
    }

    let percentage: Vec<f64> = pairs
        .iter()
        .filter(|(_, actual)| *actual > 0.0)
        .map(|(predicted, actual)| (predicted - actual).abs() / actual * 100.0)
        .collect();

    if percentage.is_empty() {
        pairs
            .iter()
            .map(|(predicted, actual)| (predicted - actual).abs())
            .sum::<f64>()
            / pairs.len() as f64
    } else {
        percentage.iter().sum::<f64>() / percentage.len() as f64
    }
}
