use crate::server::AppState;
use chrono::NaiveDate;
use ntex::web::types::{Query, State};
use ntex::web::HttpResponse;
use rust_decimal::Decimal;
use sales_forecast::dashboard::DashboardFilter;
use sales_forecast::models::ForecastError;
use sales_forecast::ranking::{ProductFilter, ProductRanking};
use sales_forecast::types::{Granularity, ProductForecastSummary, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::error;

/// Horizons of the product detail view.
const DETAIL_HORIZONS: [usize; 3] = [1, 7, 30];

#[derive(Debug, Deserialize)]
pub struct ProductForecastQuery {
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "default_top")]
    pub top: usize,
    pub product_id: Option<ProductId>,
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductForecastQuery {
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category.clone(),
            search: self.search.clone(),
            active_only: self.active,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub product: Option<String>,
}

impl DashboardQuery {
    pub fn filter(&self) -> DashboardFilter {
        DashboardFilter {
            start: self.start,
            end: self.end,
            product: self
                .product
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

fn default_horizon() -> usize {
    7
}

fn default_top() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    pub lookback: Option<usize>,
}

fn default_granularity() -> Granularity {
    Granularity::Daily
}

#[derive(Debug, Serialize)]
struct ProductForecastResponse {
    #[serde(flatten)]
    ranking: ProductRanking,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_detail: Option<ProductForecastSummary>,
}

fn error_response(e: ForecastError) -> HttpResponse {
    match e {
        ForecastError::InvalidParameter { message } => {
            HttpResponse::BadRequest().json(&json!({ "error": message }))
        }
        e => {
            error!("Forecast request failed: {}", e);
            HttpResponse::InternalServerError().json(&json!({ "error": e.to_string() }))
        }
    }
}

pub async fn dashboard(state: State<Arc<AppState>>, query: Query<DashboardQuery>) -> HttpResponse {
    if let (Some(start), Some(end)) = (query.start, query.end) {
        if start > end {
            return error_response(ForecastError::invalid_parameter(format!(
                "Start {} is after end {}",
                start, end
            )));
        }
    }

    match state.dashboard(&query.filter()) {
        Ok(payload) => HttpResponse::Ok().json(&payload),
        Err(e) => error_response(e),
    }
}

pub async fn series(state: State<Arc<AppState>>, query: Query<SeriesQuery>) -> HttpResponse {
    let lookback = query.lookback.unwrap_or(match query.granularity {
        Granularity::Daily => state.config().daily.lookback,
        Granularity::Weekly => state.config().weekly.lookback,
        Granularity::Monthly => state.config().monthly.lookback,
    });

    match state.get_series(query.granularity, lookback) {
        Ok(series) => HttpResponse::Ok().json(&series),
        Err(e) => error_response(e),
    }
}

pub async fn product_forecast(
    state: State<Arc<AppState>>,
    query: Query<ProductForecastQuery>,
) -> HttpResponse {
    let max_horizon = state.config().max_lookback;
    if query.horizon > max_horizon {
        return error_response(ForecastError::invalid_parameter(format!(
            "Horizon must be at most {} days",
            max_horizon
        )));
    }

    let ledger = state.source();

    let product_detail = match query.product_id {
        Some(product_id) if ledger.product(product_id).is_none() => {
            return HttpResponse::NotFound()
                .json(&json!({ "error": format!("Unknown product {}", product_id) }));
        }
        Some(product_id) => {
            let horizons: BTreeSet<usize> = DETAIL_HORIZONS.into_iter().collect();
            match state.get_product_summary(product_id, &horizons, state.config().product_lookback) {
                Ok(summary) => Some(summary),
                Err(e) => return error_response(e),
            }
        }
        None => None,
    };

    match state.rank_products(&query.filter(), query.horizon, query.top) {
        Ok(ranking) => HttpResponse::Ok().json(&ProductForecastResponse {
            ranking,
            product_detail,
        }),
        Err(e) => error_response(e),
    }
}
