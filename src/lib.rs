//! Sales forecasting core: outlier-safe aggregation of point-of-sale records, a family of
//! estimators with backtest-based model selection, per-product summaries and the
//! dashboard payload built from them.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod models;
pub mod overview;
pub mod ranking;
pub mod service;
pub mod source;
pub mod summary;
pub mod types;
pub mod utils;
