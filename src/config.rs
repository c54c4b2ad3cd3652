use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
pub struct Config {
    #[arg(long, env = "SERVER_ADDRESS", default_value = "0.0.0.0:8080")]
    pub server_address: SocketAddr,

    // JSON snapshot of products and sale records to forecast from
    #[arg(long, env = "SALES_FILE")]
    pub sales_file: PathBuf,

    // Per-record unit cap applied before bucketing
    #[arg(long, env = "MAX_UNITS_PER_RECORD", default_value_t = 100)]
    pub max_units_per_record: u32,

    #[arg(long, env = "ESTIMATOR_WINDOW", default_value_t = 3)]
    pub window: usize,

    // Number of trailing points held out when backtesting estimators
    #[arg(long, env = "BACKTEST_HOLDOUT", default_value_t = 3)]
    pub backtest_holdout: usize,

    #[arg(long, env = "MAX_LOOKBACK", default_value_t = 180)]
    pub max_lookback: usize,

    // Days of history behind per-product summaries and rankings
    #[arg(long, env = "PRODUCT_LOOKBACK", default_value_t = 180)]
    pub product_lookback: usize,

    #[arg(long, env = "CURRENCY", default_value = "₱")]
    pub currency: String,

    // Forces the dependency-free estimator set, as if the numeric feature was not built
    #[arg(long, env = "DISABLE_NUMERIC", default_value_t = false)]
    pub disable_numeric: bool,
}

impl Config {
    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig {
            max_units_per_record: self.max_units_per_record,
            window: self.window.max(1),
            backtest_holdout: self.backtest_holdout,
            max_lookback: self.max_lookback.max(1),
            product_lookback: self.product_lookback.max(1),
            currency: self.currency.clone(),
            ..ForecastConfig::default()
        }
    }
}

/// Lookback and horizon used for one granularity of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSettings {
    pub lookback: usize,
    pub horizon: usize,
}

/// Tunables for aggregation, estimation and model selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub max_units_per_record: u32,
    /// Recent window used by the moving-median and trimmed-mean estimators
    pub window: usize,
    pub min_regression_points: usize,
    pub backtest_holdout: usize,
    /// Half-width of the uncertainty band in standard deviations
    pub band_multiplier: f64,
    /// A spike is only suppressed when the max exceeds `spike_ratio` x median
    pub spike_ratio: f64,
    pub spike_percentile: f64,
    pub smoothing_alpha: f64,
    pub smoothing_beta: f64,
    pub max_lookback: usize,
    pub product_lookback: usize,
    /// Currency symbol reported next to revenue figures
    pub currency: String,
    pub daily: PeriodSettings,
    pub weekly: PeriodSettings,
    pub monthly: PeriodSettings,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            max_units_per_record: 100,
            window: 3,
            min_regression_points: 2,
            backtest_holdout: 3,
            band_multiplier: 1.5,
            spike_ratio: 10.0,
            spike_percentile: 0.95,
            smoothing_alpha: 0.5,
            smoothing_beta: 0.3,
            max_lookback: 180,
            product_lookback: 180,
            currency: "₱".to_string(),
            daily: PeriodSettings {
                lookback: 60,
                horizon: 30,
            },
            weekly: PeriodSettings {
                lookback: 12,
                horizon: 12,
            },
            monthly: PeriodSettings {
                lookback: 12,
                horizon: 6,
            },
        }
    }
}
