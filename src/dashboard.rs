use crate::source::Product;
use crate::types::{
    Accuracy, ForecastResult, Granularity, MethodKind, PeriodOverview, ProductForecastSummary,
    ProductId, TimeSeriesPoint, Trend,
};
use crate::utils::round_to_2_places;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DATA_SOURCE: &str = "db";

/// Chart data of one granularity: the actual series and the forecast that follows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPayload {
    pub labels: Vec<String>,
    pub actual: Vec<f64>,
    pub forecast: Vec<u64>,
    pub upper: Vec<u64>,
    pub lower: Vec<u64>,
    pub confidence: f64,
    pub accuracy: Accuracy,
    pub method: MethodKind,
}

impl SeriesPayload {
    pub fn new(series: &[TimeSeriesPoint], result: &ForecastResult) -> Self {
        Self {
            labels: series.iter().map(|point| point.label.clone()).collect(),
            actual: series.iter().map(|point| point.value).collect(),
            forecast: result.forecast.clone(),
            upper: result.upper.clone(),
            lower: result.lower.clone(),
            confidence: result.confidence,
            accuracy: result.accuracy,
            method: result.method,
        }
    }
}

/// Optional narrowing of the dashboard: a label range for the charts and a product name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub product: Option<String>,
}

impl DashboardFilter {
    /// Keeps the points whose label falls in `[start, end]`. Monthly labels are compared
    /// against the month of each bound.
    pub fn trim(&self, granularity: Granularity, series: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
        if self.start.is_none() && self.end.is_none() {
            return series;
        }

        let bound = |date: NaiveDate| match granularity {
            Granularity::Monthly => date.format("%Y-%m").to_string(),
            Granularity::Daily | Granularity::Weekly => date.format("%Y-%m-%d").to_string(),
        };
        let start = self.start.map(bound);
        let end = self.end.map(bound);

        series
            .into_iter()
            .filter(|point| start.as_ref().map_or(true, |start| point.label >= *start))
            .filter(|point| end.as_ref().map_or(true, |end| point.label <= *end))
            .collect()
    }

    pub fn keeps_product(&self, name: &str) -> bool {
        self.product.as_deref().map_or(true, |product| product == name)
    }
}

/// Next-period outlook of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSnapshot {
    pub product: String,
    pub product_id: ProductId,
    pub forecast: u64,
    pub avg: f64,
    pub trend: Trend,
    pub confidence: f64,
    pub accuracy: Accuracy,
    pub last_7_days: u64,
}

impl ProductSnapshot {
    /// `None` unless the summary includes the one-period horizon.
    pub fn new(product: &Product, summary: &ProductForecastSummary) -> Option<Self> {
        let next = summary.horizons.get(&1)?;

        Some(Self {
            product: product.name.clone(),
            product_id: product.id,
            forecast: next.total_units,
            avg: round_to_2_places(summary.average),
            trend: summary.trend,
            confidence: next.result.confidence.round(),
            accuracy: next.result.accuracy,
            last_7_days: summary.last_7_days,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummaries {
    pub daily: PeriodOverview,
    pub weekly: PeriodOverview,
    pub monthly: PeriodOverview,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPayload {
    pub daily: SeriesPayload,
    pub weekly: SeriesPayload,
    pub monthly: SeriesPayload,
    pub summary: PeriodSummaries,
    pub ai_insights: Vec<String>,
    pub products: Vec<ProductSnapshot>,
    /// Revenue per unit over the last 30 days
    pub avg_unit_price: Decimal,
    pub currency: String,
    pub data_source: &'static str,
}
