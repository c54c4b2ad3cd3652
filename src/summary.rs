//! Per-product multi-horizon forecasts.
//!
//! A one-period horizon uses the trimmed-mean single-step estimator over the product's raw
//! sale quantities. Longer horizons run the selected full-series estimator over the
//! capped daily series. The two report confidence differently: R² of the raw quantities
//! for the single step, the backtest winner's own confidence otherwise.

use crate::aggregate::aggregate;
use crate::config::ForecastConfig;
use crate::models::{ensure_horizon, ForecastError, ModelSelector};
use crate::types::{
    series_values, Granularity, HorizonForecast, ProductForecastSummary, ProductId, SaleRecord,
};
use crate::utils::{mean, round_to_1_place};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

pub struct Summarizer<'a> {
    pub selector: &'a ModelSelector,
    pub config: &'a ForecastConfig,
}

impl Summarizer<'_> {
    pub fn summarize(
        &self,
        product_id: ProductId,
        records: &[SaleRecord],
        unit_price: Decimal,
        horizons: &BTreeSet<usize>,
        lookback: usize,
        today: NaiveDate,
    ) -> Result<ProductForecastSummary, ForecastError> {
        for horizon in horizons {
            ensure_horizon(*horizon)?;
        }

        let mut records: Vec<&SaleRecord> = records
            .iter()
            .filter(|record| record.product_id == product_id)
            .collect();
        records.sort_by_key(|record| record.date);

        let owned: Vec<SaleRecord> = records.iter().map(|record| (*record).clone()).collect();
        let series = aggregate(
            &owned,
            Granularity::Daily,
            lookback,
            today,
            self.config.max_units_per_record,
        );
        let daily = series_values(&series);

        let first_day = series
            .first()
            .and_then(|point| NaiveDate::parse_from_str(&point.label, "%Y-%m-%d").ok())
            .unwrap_or(today);

        let quantities: Vec<f64> = records
            .iter()
            .filter(|record| record.date >= first_day && record.date <= today)
            .map(|record| record.quantity as f64)
            .collect();

        let single_step = self.selector.single_step().forecast_next(&quantities);

        let mut forecasts = BTreeMap::new();
        for horizon in horizons {
            let result = if *horizon == 1 {
                single_step.result.clone()
            } else {
                self.selector.forecast(&daily, *horizon, None)?
            };

            let total_units = result.total();
            let comparison_base = trailing_total(&daily, *horizon);
            let growth_rate = growth_rate(total_units, comparison_base);
            let projected_revenue = (Decimal::from(total_units) * unit_price).round_dp(2);

            forecasts.insert(
                *horizon,
                HorizonForecast {
                    result,
                    total_units,
                    comparison_base,
                    growth_rate,
                    projected_revenue,
                },
            );
        }

        Ok(ProductForecastSummary {
            product_id,
            horizons: forecasts,
            trend: single_step.trend,
            last_7_days: trailing_total(&daily, 7),
            last_30_days: trailing_total(&daily, 30),
            average: mean(&daily),
            unit_price,
            series,
        })
    }
}

/// Sum of the last `periods` values.
pub fn trailing_total(values: &[f64], periods: usize) -> u64 {
    let start = values.len().saturating_sub(periods);
    values[start..].iter().sum::<f64>().round() as u64
}

/// Percentage growth of the forecast over the comparable actual total, to one decimal.
/// 0 without a base.
pub fn growth_rate(forecast_total: u64, comparison_base: u64) -> f64 {
    if comparison_base == 0 {
        return 0.0;
    }

    round_to_1_place(
        (forecast_total as f64 - comparison_base as f64) / comparison_base as f64 * 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capabilities;
    use crate::types::{MethodKind, Trend};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
    }

    fn sale(product_id: ProductId, days_ago: i64, quantity: u32) -> SaleRecord {
        SaleRecord {
            product_id,
            date: today() - Duration::days(days_ago),
            quantity,
            revenue: Decimal::from(quantity) * dec!(2.5),
        }
    }

    fn horizons(values: &[usize]) -> BTreeSet<usize> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(120, 100), 20.0);
        assert_eq!(growth_rate(50, 0), 0.0);
        assert_eq!(growth_rate(0, 40), -100.0);
        // 126 against 77 is 63.636..%
        assert_eq!(growth_rate(126, 77), 63.6);
    }

    #[test]
    fn test_trailing_total() {
        assert_eq!(trailing_total(&[1.0, 2.0, 3.0, 4.0], 2), 7);
        assert_eq!(trailing_total(&[1.0, 2.0], 7), 3);
    }

    #[test]
    fn test_small_product_single_step() {
        let config = ForecastConfig::default();
        let selector = ModelSelector::new(config.clone(), Capabilities::detect());
        let summarizer = Summarizer {
            selector: &selector,
            config: &config,
        };

        let records = vec![sale(1, 2, 2), sale(1, 1, 3), sale(1, 0, 4), sale(2, 0, 90)];

        let summary = summarizer
            .summarize(1, &records, dec!(2.5), &horizons(&[1, 7]), 30, today())
            .unwrap();

        let next = &summary.horizons[&1];
        assert_eq!(next.result.forecast, vec![3]);
        assert_eq!(next.result.method, MethodKind::TrimmedMean);
        assert_eq!(next.projected_revenue, dec!(7.50));

        assert_eq!(summary.trend, Trend::Increasing);
        assert_eq!(summary.last_7_days, 9);
        assert_eq!(summary.series.len(), 30);
        assert_eq!(summary.horizons[&7].result.horizon(), 7);
        assert_eq!(summary.horizons[&7].comparison_base, 9);
    }

    #[test]
    fn test_spike_is_capped_in_series() {
        let config = ForecastConfig::default();
        let selector = ModelSelector::new(config.clone(), Capabilities::detect());
        let summarizer = Summarizer {
            selector: &selector,
            config: &config,
        };

        let records = vec![sale(1, 3, 3000), sale(1, 3, 14)];

        let summary = summarizer
            .summarize(1, &records, dec!(1), &horizons(&[7]), 14, today())
            .unwrap();

        assert_eq!(summary.last_7_days, 114);
    }

    #[test]
    fn test_product_without_sales() {
        let config = ForecastConfig::default();
        let selector = ModelSelector::new(config.clone(), Capabilities::detect());
        let summarizer = Summarizer {
            selector: &selector,
            config: &config,
        };

        let summary = summarizer
            .summarize(5, &[], dec!(4), &horizons(&[1, 7, 30]), 60, today())
            .unwrap();

        for forecast in summary.horizons.values() {
            assert!(forecast.result.forecast.iter().all(|v| *v == 0));
            assert_eq!(forecast.result.confidence, 0.0);
            assert_eq!(forecast.growth_rate, 0.0);
            assert_eq!(forecast.projected_revenue, Decimal::ZERO);
        }
        assert_eq!(summary.trend, Trend::Stable);
        assert_eq!(summary.average, 0.0);
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let config = ForecastConfig::default();
        let selector = ModelSelector::new(config.clone(), Capabilities::detect());
        let summarizer = Summarizer {
            selector: &selector,
            config: &config,
        };

        let result = summarizer.summarize(1, &[], dec!(1), &horizons(&[0, 7]), 30, today());

        assert!(matches!(result, Err(ForecastError::InvalidParameter { .. })));
    }

    #[cfg(feature = "numeric")]
    #[test]
    fn test_growth_against_trailing_week() {
        let config = ForecastConfig::default();
        let selector = ModelSelector::new(config.clone(), Capabilities::detect());
        let summarizer = Summarizer {
            selector: &selector,
            config: &config,
        };

        // 1, 2, ..., 14 units a day, ending today
        let records: Vec<SaleRecord> = (0..14).map(|i| sale(1, 13 - i, i as u32 + 1)).collect();

        let summary = summarizer
            .summarize(1, &records, dec!(1), &horizons(&[7]), 14, today())
            .unwrap();

        let week = &summary.horizons[&7];
        assert_eq!(week.result.method, MethodKind::LinearTrend);
        // 15 + 16 + ... + 21
        assert_eq!(week.total_units, 126);
        // 8 + 9 + ... + 14
        assert_eq!(week.comparison_base, 77);
        assert_eq!(week.growth_rate, 63.6);
        assert_eq!(week.projected_revenue, dec!(126));
    }
}
