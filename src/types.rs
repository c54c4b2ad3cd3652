use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

pub type ProductId = u64;

/// A single sale as recorded by the point-of-sale ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub product_id: ProductId,
    pub date: NaiveDate,
    /// Units sold in this sale
    pub quantity: u32,
    /// Revenue collected for this sale
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// ISO date (daily), ISO date of the week's Monday (weekly) or `YYYY-MM` (monthly)
    pub label: String,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Values of a series, oldest to newest.
pub fn series_values(series: &[TimeSeriesPoint]) -> Vec<f64> {
    series.iter().map(|point| point.value).collect()
}

#[derive(Debug, Clone, Copy, EnumString, Display, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// First calendar day of the bucket that contains `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Granularity::Monthly => date - Duration::days(date.day0() as i64),
        }
    }

    /// Bucket starts of the `lookback` periods ending with the period containing `today`,
    /// oldest first.
    pub fn window_starts(&self, today: NaiveDate, lookback: usize) -> Vec<NaiveDate> {
        let current = self.bucket_start(today);

        (0..lookback)
            .rev()
            .filter_map(|offset| match self {
                Granularity::Daily => Some(current - Duration::days(offset as i64)),
                Granularity::Weekly => Some(current - Duration::weeks(offset as i64)),
                Granularity::Monthly => current.checked_sub_months(Months::new(offset as u32)),
            })
            .collect()
    }

    pub fn label(&self, bucket_start: NaiveDate) -> String {
        match self {
            Granularity::Daily | Granularity::Weekly => bucket_start.format("%Y-%m-%d").to_string(),
            Granularity::Monthly => bucket_start.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, EnumString, Display, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    LinearTrend,
    ExponentialSmoothing,
    MovingMedian,
    TrimmedMean,
}

#[derive(Debug, Clone, Copy, EnumString, Display, Deserialize, Serialize, Hash, PartialEq, Eq)]
pub enum Accuracy {
    High,
    Medium,
    Low,
}

impl Accuracy {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 70.0 {
            Accuracy::High
        } else if confidence >= 40.0 {
            Accuracy::Medium
        } else {
            Accuracy::Low
        }
    }
}

#[derive(Debug, Clone, Copy, EnumString, Display, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn between(first: f64, last: f64) -> Self {
        if last > first {
            Trend::Increasing
        } else if last < first {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, EnumString, Display, Deserialize, Serialize, Hash, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Arrow {
    Up,
    Down,
    Same,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Estimator that produced the forecast
    pub method: MethodKind,
    /// One value per future period
    pub forecast: Vec<u64>,
    pub upper: Vec<u64>,
    pub lower: Vec<u64>,
    /// Always on a 0-100 scale
    pub confidence: f64,
    pub accuracy: Accuracy,
}

impl ForecastResult {
    pub fn new(
        method: MethodKind,
        forecast: Vec<u64>,
        upper: Vec<u64>,
        lower: Vec<u64>,
        confidence: f64,
    ) -> Self {
        let confidence = clamp_confidence(confidence);

        Self {
            method,
            forecast,
            upper,
            lower,
            confidence,
            accuracy: Accuracy::from_confidence(confidence),
        }
    }

    /// All-zero forecast with zero confidence, used when there is nothing to learn from.
    pub fn zero(method: MethodKind, horizon: usize) -> Self {
        Self::new(
            method,
            vec![0; horizon],
            vec![0; horizon],
            vec![0; horizon],
            0.0,
        )
    }

    /// Builds a forecast from raw (unrounded) projections and a symmetric band half-width.
    /// Keeps `lower <= forecast <= upper` and everything non-negative after rounding.
    pub fn from_projection(
        method: MethodKind,
        projections: &[f64],
        band: f64,
        confidence: f64,
    ) -> Self {
        let band = if band.is_finite() { band.abs() } else { 0.0 };
        let mut forecast = Vec::with_capacity(projections.len());
        let mut upper = Vec::with_capacity(projections.len());
        let mut lower = Vec::with_capacity(projections.len());

        for raw in projections {
            let point = round_non_negative(*raw);
            forecast.push(point);
            upper.push(round_non_negative(raw + band).max(point));
            lower.push(round_non_negative(raw - band).min(point));
        }

        Self::new(method, forecast, upper, lower, confidence)
    }

    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }

    /// Total units over the whole horizon.
    pub fn total(&self) -> u64 {
        self.forecast.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodOverview {
    /// Latest period value
    pub total: u64,
    /// Period before the latest
    pub previous: u64,
    pub pct_change: f64,
    pub arrow: Arrow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonForecast {
    pub result: ForecastResult,
    /// Units forecast over the whole horizon
    pub total_units: u64,
    /// Actual units over the comparable trailing window
    pub comparison_base: u64,
    pub growth_rate: f64,
    pub projected_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductForecastSummary {
    pub product_id: ProductId,
    /// Keyed by horizon length
    pub horizons: BTreeMap<usize, HorizonForecast>,
    pub trend: Trend,
    pub last_7_days: u64,
    pub last_30_days: u64,
    /// Mean daily units across the lookback window
    pub average: f64,
    pub unit_price: Decimal,
    pub series: Vec<TimeSeriesPoint>,
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn round_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
