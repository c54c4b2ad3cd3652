//! Cross-product ranking of per-product forecasts for one horizon.

use crate::source::Product;
use crate::types::{Accuracy, ProductForecastSummary, ProductId, Trend};
use crate::utils::round_to_2_places;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Minimum number of rows in the trending list when that many products exist.
const MIN_TRENDING: usize = 10;

/// Narrows the catalogue before ranking. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
    pub active_only: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty()
                && !product
                    .name
                    .to_lowercase()
                    .contains(&search.to_lowercase())
            {
                return false;
            }
        }

        if self.active_only && !product.is_active {
            return false;
        }

        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }

        !self.max_price.is_some_and(|max| product.price > max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub product: String,
    pub category: Option<String>,
    pub is_active: bool,
    /// Units forecast over the whole horizon
    pub forecast: u64,
    pub confidence: f64,
    pub accuracy: Accuracy,
    pub trend: Trend,
    pub last_7_days: u64,
    pub past_30_days: u64,
    pub avg: f64,
    pub growth_rate: f64,
    pub price: Decimal,
    pub projected_revenue: Decimal,
}

impl ProductRow {
    /// Row for `horizon`, `None` when the summary was not computed for it.
    pub fn new(product: &Product, summary: &ProductForecastSummary, horizon: usize) -> Option<Self> {
        let forecast = summary.horizons.get(&horizon)?;

        Some(Self {
            product_id: product.id,
            product: product.name.clone(),
            category: product.category.clone(),
            is_active: product.is_active,
            forecast: forecast.total_units,
            confidence: forecast.result.confidence,
            accuracy: forecast.result.accuracy,
            trend: summary.trend,
            last_7_days: summary.last_7_days,
            past_30_days: summary.last_30_days,
            avg: round_to_2_places(summary.average),
            growth_rate: forecast.growth_rate,
            price: summary.unit_price,
            projected_revenue: forecast.projected_revenue,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTotals {
    pub total_forecast_units: u64,
    pub projected_revenue: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRanking {
    pub horizon: usize,
    pub top: Vec<ProductRow>,
    pub trending: Vec<ProductRow>,
    pub best: Option<ProductRow>,
    pub summary: RankingTotals,
}

/// Ranks rows by forecast volume and by growth.
///
/// Both orderings are stable, so equal rows keep the order they were given in.
pub fn rank(rows: Vec<ProductRow>, horizon: usize, top: usize) -> ProductRanking {
    let totals = RankingTotals {
        total_forecast_units: rows.iter().map(|row| row.forecast).sum(),
        projected_revenue: rows
            .iter()
            .map(|row| row.projected_revenue)
            .sum::<Decimal>()
            .round_dp(2),
        count: rows.len(),
    };

    let mut by_growth = rows.clone();
    by_growth.sort_by(|a, b| {
        b.growth_rate
            .partial_cmp(&a.growth_rate)
            .unwrap_or(Ordering::Equal)
    });
    by_growth.truncate(top.max(MIN_TRENDING));

    let mut by_forecast = rows;
    by_forecast.sort_by(|a, b| b.forecast.cmp(&a.forecast));
    let best = by_forecast.first().cloned();
    by_forecast.truncate(top);

    ProductRanking {
        horizon,
        top: by_forecast,
        trending: by_growth,
        best,
        summary: totals,
    }
}
