//! Outlier-safe aggregation of sale records into fixed-length, zero-filled series.

use crate::types::{Granularity, SaleRecord, TimeSeriesPoint};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// First day covered by a `lookback`-period window ending with the period of `today`.
pub fn window_start(granularity: Granularity, today: NaiveDate, lookback: usize) -> NaiveDate {
    granularity
        .window_starts(today, lookback)
        .first()
        .copied()
        .unwrap_or_else(|| granularity.bucket_start(today))
}

/// Buckets `records` into one point per period of the window, oldest first.
///
/// Each record contributes at most `max_units_per_record` units. Periods without sales
/// are present with a value of 0, and records outside the window are ignored.
pub fn aggregate(
    records: &[SaleRecord],
    granularity: Granularity,
    lookback: usize,
    today: NaiveDate,
    max_units_per_record: u32,
) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, u64> = granularity
        .window_starts(today, lookback)
        .into_iter()
        .map(|start| (start, 0))
        .collect();

    for record in records.iter().filter(|record| record.date <= today) {
        let start = granularity.bucket_start(record.date);

        if let Some(total) = buckets.get_mut(&start) {
            *total += record.quantity.min(max_units_per_record) as u64;
        }
    }

    buckets
        .into_iter()
        .map(|(start, total)| TimeSeriesPoint::new(granularity.label(start), total as f64))
        .collect()
}

/// Total revenue divided by total (uncapped) units, 0 when nothing sold.
pub fn average_unit_price(records: &[SaleRecord]) -> Decimal {
    let (revenue, units) = records
        .iter()
        .fold((Decimal::ZERO, 0u64), |(revenue, units), record| {
            (revenue + record.revenue, units + record.quantity as u64)
        });

    if units == 0 {
        return Decimal::ZERO;
    }

    revenue / Decimal::from(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        // A Wednesday
        NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
    }

    fn sale(date: NaiveDate, quantity: u32) -> SaleRecord {
        SaleRecord {
            product_id: 1,
            date,
            quantity,
            revenue: Decimal::from(quantity),
        }
    }

    #[test]
    fn test_empty_daily_is_zero_filled() {
        let series = aggregate(&[], Granularity::Daily, 7, today(), 100);

        assert_eq!(series.len(), 7);
        assert!(series.iter().all(|point| point.value == 0.0));
        assert_eq!(series.first().unwrap().label, "2025-06-05");
        assert_eq!(series.last().unwrap().label, "2025-06-11");

        for pair in series.windows(2) {
            let a = NaiveDate::parse_from_str(&pair[0].label, "%Y-%m-%d").unwrap();
            let b = NaiveDate::parse_from_str(&pair[1].label, "%Y-%m-%d").unwrap();
            assert_eq!(b - a, Duration::days(1));
        }
    }

    #[test]
    fn test_weekly_capping() {
        let monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let records = vec![sale(monday, 3000), sale(monday + Duration::days(1), 14)];

        let series = aggregate(&records, Granularity::Weekly, 4, today(), 100);

        assert_eq!(series.len(), 4);
        assert_eq!(series.last().unwrap().label, "2025-06-09");
        assert_eq!(series.last().unwrap().value, 114.0);
        assert!(series[..3].iter().all(|point| point.value == 0.0));
    }

    #[test]
    fn test_cap_is_configurable() {
        let records = vec![sale(today(), 30), sale(today(), 5)];

        let series = aggregate(&records, Granularity::Daily, 1, today(), 10);

        assert_eq!(series[0].value, 15.0);
    }

    #[test]
    fn test_monthly_labels_and_totals() {
        let records = vec![
            sale(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(), 4),
            sale(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 2),
            sale(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 3),
            // Outside the window
            sale(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), 50),
        ];

        let series = aggregate(&records, Granularity::Monthly, 3, today(), 100);

        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2025-04", "2025-05", "2025-06"]);
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![4.0, 0.0, 5.0]);
    }

    #[test]
    fn test_future_records_ignored() {
        let records = vec![sale(today() + Duration::days(1), 9)];

        let series = aggregate(&records, Granularity::Weekly, 2, today(), 100);

        assert!(series.iter().all(|point| point.value == 0.0));
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let records = vec![sale(today(), 4), sale(today() - Duration::days(3), 8)];

        let first = aggregate(&records, Granularity::Daily, 10, today(), 100);
        let second = aggregate(&records, Granularity::Daily, 10, today(), 100);

        assert_eq!(first, second);
    }

    #[test]
    fn test_window_start() {
        assert_eq!(
            window_start(Granularity::Weekly, today(), 2),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
        assert_eq!(
            window_start(Granularity::Daily, today(), 1),
            today()
        );
    }

    #[test]
    fn test_average_unit_price() {
        let records = vec![
            SaleRecord {
                product_id: 1,
                date: today(),
                quantity: 2,
                revenue: dec!(25.00),
            },
            SaleRecord {
                product_id: 2,
                date: today(),
                quantity: 5,
                revenue: dec!(20.50),
            },
        ];

        assert_eq!(average_unit_price(&records), dec!(6.5));
        assert_eq!(average_unit_price(&[]), Decimal::ZERO);
    }
}
