use ntex::web::HttpResponse;
use sales_forecast::metrics::get_metrics;
use tracing::error;

/// Prometheus scrape endpoint. Empty when metrics were not initialised.
pub async fn export() -> HttpResponse {
    let Some(metrics) = get_metrics() else {
        return HttpResponse::Ok().body("");
    };

    match metrics.render() {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(text),
        Err(e) => {
            error!("Failed to render metrics: {:#}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
