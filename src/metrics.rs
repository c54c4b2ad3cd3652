use crate::types::{ForecastResult, Granularity};
use anyhow::{anyhow, Context, Result};
use opentelemetry::metrics::MeterProvider;
use opentelemetry::KeyValue;
use opentelemetry_sdk::{metrics::SdkMeterProvider, Resource};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::{Arc, OnceLock};

pub static METRICS: OnceLock<Arc<Metrics>> = OnceLock::new();

pub fn init_metrics(namespace: &str) -> Result<()> {
    let metrics = Arc::new(Metrics::new(namespace)?);

    METRICS
        .set(metrics)
        .map_err(|_| anyhow!("Metric client is already initialized"))?;

    Ok(())
}

/// `None` until `init_metrics` has run. Library users that never start the service
/// get no metrics and pay nothing for them.
pub fn get_metrics() -> Option<Arc<Metrics>> {
    METRICS.get().cloned()
}

/// Publishes the confidence and next-period units of a dashboard forecast.
pub fn record_forecast(granularity: Granularity, result: &ForecastResult) {
    let Some(metrics) = get_metrics() else {
        return;
    };

    let labels = [
        KeyValue::new("granularity", granularity.to_string()),
        KeyValue::new("method", result.method.to_string()),
    ];

    metrics.forecast_confidence.record(result.confidence, &labels);

    if let Some(next) = result.forecast.first() {
        metrics
            .forecast_units
            .record(*next as f64, &labels[..1]);
    }
}

#[derive(Debug)]
pub struct Metrics {
    pub registry: Registry,
    pub forecast_confidence: opentelemetry::metrics::Gauge<f64>,
    pub forecast_units: opentelemetry::metrics::Gauge<f64>,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
}

impl Metrics {
    pub fn new(service: &str) -> Result<Self> {
        let registry = Registry::new();

        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .context("Creating metrics exporter")?;

        let provider = SdkMeterProvider::builder()
            .with_reader(exporter)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service.to_string(),
            )]))
            .build();

        let meter = provider.meter(service.to_string());

        Ok(Self {
            registry,
            provider,
            forecast_confidence: meter
                .f64_gauge("sales_forecast_confidence")
                .with_description("Confidence (0-100) of the latest forecast per granularity and method.")
                .init(),
            forecast_units: meter
                .f64_gauge("sales_forecast_units")
                .with_description("Units forecast for the next period per granularity.")
                .init(),
        })
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Encoding metrics")?;

        String::from_utf8(buffer).context("Metrics are not valid UTF-8")
    }
}
