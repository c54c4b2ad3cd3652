use crate::aggregate::{aggregate, average_unit_price, window_start};
use crate::config::{ForecastConfig, PeriodSettings};
use crate::dashboard::{
    DashboardFilter, DashboardPayload, PeriodSummaries, ProductSnapshot, SeriesPayload,
    DATA_SOURCE,
};
use crate::metrics::record_forecast;
use crate::models::{Capabilities, ForecastError, ModelSelector};
use crate::overview::{insight, overview};
use crate::ranking::{rank, ProductFilter, ProductRanking, ProductRow};
use crate::source::{Product, SalesSource};
use crate::summary::Summarizer;
use crate::types::{
    series_values, ForecastResult, Granularity, MethodKind, PeriodOverview, ProductForecastSummary,
    ProductId, SaleRecord, TimeSeriesPoint,
};
use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

/// Days of sales behind the dashboard's average unit price.
const UNIT_PRICE_DAYS: i64 = 30;

/// Entry point of the forecasting core.
///
/// Owns the sales source and the model selector. Every operation is a pure function of
/// the source's data and "today", so concurrent callers need no coordination.
pub struct Forecaster<S> {
    source: S,
    config: ForecastConfig,
    selector: ModelSelector,
    today: Option<NaiveDate>,
}

impl<S: SalesSource> Forecaster<S> {
    pub fn new(source: S, config: ForecastConfig, capabilities: Capabilities) -> Self {
        let selector = ModelSelector::new(config.clone(), capabilities);

        Self {
            source,
            config,
            selector,
            today: None,
        }
    }

    /// Pins the calendar date the windows end on.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn check_lookback(&self, lookback: usize) -> Result<usize, ForecastError> {
        if lookback == 0 {
            return Err(ForecastError::invalid_parameter(
                "Lookback must be at least one period",
            ));
        }

        if lookback > self.config.max_lookback {
            debug!(
                "Lookback {} clamped to {}",
                lookback, self.config.max_lookback
            );
            return Ok(self.config.max_lookback);
        }

        Ok(lookback)
    }

    /// Records of the window, empty when the source is unavailable.
    fn fetch(&self, product_id: Option<ProductId>, from: NaiveDate, to: NaiveDate) -> Vec<SaleRecord> {
        match self.source.fetch_sales(product_id, from, to) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Sales unavailable for {} to {}, using an empty window: {}",
                    from, to, e
                );
                Vec::new()
            }
        }
    }

    /// Total units per period, zero-filled, oldest first.
    pub fn get_series(
        &self,
        granularity: Granularity,
        lookback: usize,
    ) -> Result<Vec<TimeSeriesPoint>, ForecastError> {
        let lookback = self.check_lookback(lookback)?;
        let today = self.today();
        let from = window_start(granularity, today, lookback);

        let records = self.fetch(None, from, today);

        Ok(aggregate(
            &records,
            granularity,
            lookback,
            today,
            self.config.max_units_per_record,
        ))
    }

    pub fn get_forecast(
        &self,
        series: &[TimeSeriesPoint],
        horizon: usize,
        method_hint: Option<MethodKind>,
    ) -> Result<ForecastResult, ForecastError> {
        self.selector
            .forecast(&series_values(series), horizon, method_hint)
    }

    pub fn get_product_summary(
        &self,
        product_id: ProductId,
        horizons: &BTreeSet<usize>,
        lookback: usize,
    ) -> Result<ProductForecastSummary, ForecastError> {
        let lookback = self.check_lookback(lookback)?;
        let today = self.today();
        let from = window_start(Granularity::Daily, today, lookback);

        let records = self.fetch(Some(product_id), from, today);
        let unit_price = self.source.fetch_unit_price(product_id).unwrap_or_else(|e| {
            warn!("No unit price for product {}: {}", product_id, e);
            Decimal::ZERO
        });

        let summarizer = Summarizer {
            selector: &self.selector,
            config: &self.config,
        };

        summarizer.summarize(product_id, &records, unit_price, horizons, lookback, today)
    }

    pub fn get_overview(&self, series: &[TimeSeriesPoint]) -> PeriodOverview {
        overview(series)
    }

    pub fn get_insight(
        &self,
        period_name: &str,
        series: &[TimeSeriesPoint],
        forecast: &ForecastResult,
    ) -> String {
        insight(period_name, series, forecast)
    }

    /// Revenue per unit over the last 30 days, 0 without sales.
    pub fn average_unit_price(&self) -> Decimal {
        let today = self.today();
        let records = self.fetch(None, today - Duration::days(UNIT_PRICE_DAYS - 1), today);

        average_unit_price(&records).round_dp(2)
    }

    /// The catalogue, empty when the source is unavailable.
    fn products(&self) -> Vec<Product> {
        self.source.fetch_products().unwrap_or_else(|e| {
            warn!("Product catalogue unavailable: {}", e);
            Vec::new()
        })
    }

    fn period(
        &self,
        granularity: Granularity,
        settings: PeriodSettings,
        filter: &DashboardFilter,
    ) -> Result<(Vec<TimeSeriesPoint>, ForecastResult), ForecastError> {
        let series = filter.trim(granularity, self.get_series(granularity, settings.lookback)?);
        let result = self.get_forecast(&series, settings.horizon, None)?;

        record_forecast(granularity, &result);

        Ok((series, result))
    }

    /// Next-period outlook of every product kept by `filter`.
    pub fn product_snapshots(&self, filter: &DashboardFilter) -> Vec<ProductSnapshot> {
        let horizons: BTreeSet<usize> = [1].into_iter().collect();

        self.products()
            .iter()
            .filter(|product| filter.keeps_product(&product.name))
            .filter_map(|product| {
                match self.get_product_summary(product.id, &horizons, self.config.product_lookback) {
                    Ok(summary) => ProductSnapshot::new(product, &summary),
                    Err(e) => {
                        error!("No outlook for product {}: {}", product.id, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Daily, weekly and monthly charts with their overviews and insights, plus the
    /// next-period outlook per product.
    pub fn dashboard(&self, filter: &DashboardFilter) -> Result<DashboardPayload, ForecastError> {
        let (daily, daily_forecast) = self.period(Granularity::Daily, self.config.daily, filter)?;
        let (weekly, weekly_forecast) =
            self.period(Granularity::Weekly, self.config.weekly, filter)?;
        let (monthly, monthly_forecast) =
            self.period(Granularity::Monthly, self.config.monthly, filter)?;

        let ai_insights = [
            self.get_insight("daily", &daily, &daily_forecast),
            self.get_insight("weekly", &weekly, &weekly_forecast),
            self.get_insight("monthly", &monthly, &monthly_forecast),
        ]
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect();

        Ok(DashboardPayload {
            daily: SeriesPayload::new(&daily, &daily_forecast),
            weekly: SeriesPayload::new(&weekly, &weekly_forecast),
            monthly: SeriesPayload::new(&monthly, &monthly_forecast),
            summary: PeriodSummaries {
                daily: self.get_overview(&daily),
                weekly: self.get_overview(&weekly),
                monthly: self.get_overview(&monthly),
            },
            ai_insights,
            products: self.product_snapshots(filter),
            avg_unit_price: self.average_unit_price(),
            currency: self.config.currency.clone(),
            data_source: DATA_SOURCE,
        })
    }

    /// Ranks the products kept by `filter` by their forecast over `horizon` days.
    ///
    /// A product whose summary fails is logged and left out of the ranking.
    pub fn rank_products(
        &self,
        filter: &ProductFilter,
        horizon: usize,
        top: usize,
    ) -> Result<ProductRanking, ForecastError> {
        let horizons: BTreeSet<usize> = [horizon].into_iter().collect();

        let products: Vec<Product> = self
            .products()
            .into_iter()
            .filter(|product| filter.matches(product))
            .collect();

        let mut rows = Vec::with_capacity(products.len());
        for product in &products {
            match self.get_product_summary(product.id, &horizons, self.config.product_lookback) {
                Ok(summary) => rows.extend(ProductRow::new(product, &summary, horizon)),
                Err(e @ ForecastError::InvalidParameter { .. }) => return Err(e),
                Err(e) => error!("Skipping product {} in ranking: {}", product.id, e),
            }
        }

        Ok(rank(rows, horizon, top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Ledger;
    use crate::types::{Accuracy, Trend};
    use rust_decimal_macros::dec;

    struct Unavailable;

    impl SalesSource for Unavailable {
        fn fetch_sales(
            &self,
            _product_id: Option<ProductId>,
            _date_from: NaiveDate,
            _date_to: NaiveDate,
        ) -> Result<Vec<SaleRecord>, ForecastError> {
            Err(ForecastError::data_unavailable("connection refused"))
        }

        fn fetch_unit_price(&self, _product_id: ProductId) -> Result<Decimal, ForecastError> {
            Err(ForecastError::data_unavailable("connection refused"))
        }

        fn fetch_products(&self) -> Result<Vec<Product>, ForecastError> {
            Err(ForecastError::data_unavailable("connection refused"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
    }

    fn product(id: ProductId, name: &str, price: Decimal) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            category: None,
            is_active: true,
        }
    }

    fn sale(product_id: ProductId, days_ago: i64, quantity: u32, price: Decimal) -> SaleRecord {
        SaleRecord {
            product_id,
            date: today() - Duration::days(days_ago),
            quantity,
            revenue: Decimal::from(quantity) * price,
        }
    }

    fn ledger() -> Ledger {
        let mut sales = Vec::new();
        for day in 0..60 {
            // Pizza grows slowly, cola is flat
            sales.push(sale(1, day, 20 - (day as u32 / 6), dec!(10)));
            sales.push(sale(2, day, 5, dec!(2)));
        }

        Ledger::new(
            vec![
                product(1, "Margherita", dec!(10)),
                product(2, "Cola", dec!(2)),
                product(3, "Calzone", dec!(12)),
            ],
            sales,
        )
        .unwrap()
    }

    fn forecaster() -> Forecaster<Ledger> {
        Forecaster::new(ledger(), ForecastConfig::default(), Capabilities::detect())
            .with_today(today())
    }

    #[test]
    fn test_get_series_is_idempotent() {
        let forecaster = forecaster();

        let first = forecaster.get_series(Granularity::Daily, 14).unwrap();
        let second = forecaster.get_series(Granularity::Daily, 14).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 14);
        // Today: 20 pizzas and 5 colas
        assert_eq!(first.last().unwrap().value, 25.0);
    }

    #[test]
    fn test_get_series_rejects_zero_lookback() {
        let result = forecaster().get_series(Granularity::Weekly, 0);

        assert!(matches!(result, Err(ForecastError::InvalidParameter { .. })));
    }

    #[test]
    fn test_get_series_clamps_lookback() {
        let series = forecaster().get_series(Granularity::Daily, 10_000).unwrap();

        assert_eq!(series.len(), 180);
    }

    #[test]
    fn test_unavailable_source_yields_zero_forecast() {
        let forecaster = Forecaster::new(
            Unavailable,
            ForecastConfig::default(),
            Capabilities::detect(),
        )
        .with_today(today());

        let series = forecaster.get_series(Granularity::Weekly, 12).unwrap();
        assert_eq!(series.len(), 12);
        assert!(series.iter().all(|point| point.value == 0.0));

        let result = forecaster.get_forecast(&series, 12, None).unwrap();
        assert_eq!(result.forecast, vec![0; 12]);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.accuracy, Accuracy::Low);

        let horizons: BTreeSet<usize> = [1, 7].into_iter().collect();
        let summary = forecaster.get_product_summary(1, &horizons, 30).unwrap();
        assert_eq!(summary.unit_price, Decimal::ZERO);
        assert_eq!(summary.horizons[&7].total_units, 0);
    }

    #[test]
    fn test_get_forecast_rejects_zero_horizon() {
        let forecaster = forecaster();
        let series = forecaster.get_series(Granularity::Daily, 30).unwrap();

        let result = forecaster.get_forecast(&series, 0, None);

        assert!(matches!(result, Err(ForecastError::InvalidParameter { .. })));
    }

    #[test]
    fn test_dashboard_shape() {
        let payload = forecaster().dashboard(&DashboardFilter::default()).unwrap();

        assert_eq!(payload.daily.labels.len(), 60);
        assert_eq!(payload.daily.forecast.len(), 30);
        assert_eq!(payload.weekly.labels.len(), 12);
        assert_eq!(payload.weekly.forecast.len(), 12);
        assert_eq!(payload.monthly.labels.len(), 12);
        assert_eq!(payload.monthly.forecast.len(), 6);
        assert_eq!(payload.ai_insights.len(), 3);
        assert_eq!(payload.data_source, "db");
        assert_eq!(payload.currency, "₱");

        let names: Vec<&str> = payload.products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["Calzone", "Cola", "Margherita"]);
        let cola = &payload.products[1];
        assert_eq!(cola.forecast, 5);
        assert_eq!(cola.last_7_days, 35);
        assert_eq!(cola.trend, Trend::Stable);

        let json = serde_json::to_value(&payload).unwrap();
        for key in [
            "daily",
            "weekly",
            "monthly",
            "summary",
            "ai_insights",
            "products",
            "currency",
            "data_source",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["summary"]["weekly"].get("pct_change").is_some());
    }

    #[test]
    fn test_dashboard_filters() {
        let filter = DashboardFilter {
            start: Some(today() - Duration::days(6)),
            end: None,
            product: Some("Cola".to_string()),
        };

        let payload = forecaster().dashboard(&filter).unwrap();

        assert_eq!(payload.daily.labels.len(), 7);
        assert_eq!(payload.daily.labels[0], "2025-06-05");
        assert_eq!(payload.daily.forecast.len(), 30);
        // Only the week starting Monday 2025-06-09 and the current month remain
        assert_eq!(payload.weekly.labels, vec!["2025-06-09"]);
        assert_eq!(payload.monthly.labels, vec!["2025-06"]);

        assert_eq!(payload.products.len(), 1);
        assert_eq!(payload.products[0].product_id, 2);
    }

    #[test]
    fn test_dashboard_without_catalogue() {
        let forecaster = Forecaster::new(
            Unavailable,
            ForecastConfig::default(),
            Capabilities::detect(),
        )
        .with_today(today());

        let payload = forecaster.dashboard(&DashboardFilter::default()).unwrap();

        assert!(payload.products.is_empty());
        assert_eq!(payload.avg_unit_price, Decimal::ZERO);
        assert!(payload.daily.actual.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn test_average_unit_price() {
        let forecaster = Forecaster::new(
            Ledger::new(
                vec![product(1, "Margherita", dec!(10))],
                vec![sale(1, 0, 2, dec!(10)), sale(1, 3, 3, dec!(5))],
            )
            .unwrap(),
            ForecastConfig::default(),
            Capabilities::detect(),
        )
        .with_today(today());

        // (20 + 15) / 5
        assert_eq!(forecaster.average_unit_price(), dec!(7));
    }

    #[test]
    fn test_product_summary_uses_unit_price() {
        let forecaster = forecaster();
        let horizons: BTreeSet<usize> = [1, 7, 30].into_iter().collect();

        let summary = forecaster.get_product_summary(2, &horizons, 60).unwrap();

        assert_eq!(summary.unit_price, dec!(2));
        assert_eq!(summary.last_7_days, 35);
        assert_eq!(summary.last_30_days, 150);
        assert_eq!(summary.horizons[&1].result.forecast, vec![5]);
        assert_eq!(summary.horizons[&1].projected_revenue, dec!(10));
        assert_eq!(summary.horizons[&7].total_units, 35);
        assert_eq!(summary.horizons[&7].comparison_base, 35);
        assert_eq!(summary.horizons[&7].growth_rate, 0.0);
        assert_eq!(summary.horizons[&30].total_units, 150);
        assert_eq!(summary.horizons[&30].comparison_base, 150);
        assert_eq!(summary.horizons[&30].growth_rate, 0.0);
    }

    #[test]
    fn test_rank_products() {
        let forecaster = forecaster();

        let ranking = forecaster
            .rank_products(&ProductFilter::default(), 7, 2)
            .unwrap();

        assert_eq!(ranking.summary.count, 3);
        assert_eq!(ranking.top.len(), 2);
        assert_eq!(ranking.top[0].product_id, 1);
        assert_eq!(ranking.best.as_ref().unwrap().product, "Margherita");
        // The product without sales is ranked with nothing forecast
        assert_eq!(ranking.trending.len(), 3);
        let calzone = ranking.trending.iter().find(|row| row.product_id == 3).unwrap();
        assert_eq!(calzone.forecast, 0);
        assert_eq!(calzone.growth_rate, 0.0);
    }

    #[test]
    fn test_rank_products_applies_filter() {
        let forecaster = forecaster();
        let filter = ProductFilter {
            max_price: Some(dec!(10)),
            search: Some("a".to_string()),
            ..ProductFilter::default()
        };

        let ranking = forecaster.rank_products(&filter, 30, 10).unwrap();

        // Calzone is too expensive
        let ids: Vec<ProductId> = ranking.top.iter().map(|row| row.product_id).collect();
        assert_eq!(ranking.summary.count, 2);
        assert!(ids.contains(&1) && ids.contains(&2));
    }

    #[test]
    fn test_rank_products_uses_product_lookback() {
        let forecaster = Forecaster::new(
            Ledger::new(
                vec![product(4, "Garlic Bread", dec!(3))],
                vec![sale(4, 100, 90, dec!(3))],
            )
            .unwrap(),
            ForecastConfig::default(),
            Capabilities::detect(),
        )
        .with_today(today());

        let ranking = forecaster
            .rank_products(&ProductFilter::default(), 7, 10)
            .unwrap();

        // 90 units spread over the 180 day window
        assert_eq!(ranking.top[0].avg, 0.5);
        assert_eq!(ranking.top[0].past_30_days, 0);
    }

    #[test]
    fn test_rank_products_rejects_zero_horizon() {
        let forecaster = forecaster();

        let result = forecaster.rank_products(&ProductFilter::default(), 0, 10);

        assert!(matches!(result, Err(ForecastError::InvalidParameter { .. })));
    }
}
