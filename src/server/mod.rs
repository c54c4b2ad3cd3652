use ntex::web::{self, get, App, ServiceConfig};
use sales_forecast::service::Forecaster;
use sales_forecast::source::Ledger;
use std::{net::SocketAddr, sync::Arc};

mod responders;

type ConfigFn = fn(&mut ServiceConfig);

/// State shared by the API responders.
pub type AppState = Forecaster<Ledger>;

/// Routes of the forecasting API. Expects an `Arc<AppState>` registered as app state.
pub fn configure_api(cfg: &mut ServiceConfig) {
    cfg.route("/api/forecast", get().to(responders::forecast::dashboard))
        .route(
            "/api/product-forecast",
            get().to(responders::forecast::product_forecast),
        )
        .route("/api/series", get().to(responders::forecast::series));
}

/// Starts a server that will serve metrics, health checks and whatever `configure_app` adds
pub async fn start_server<T: 'static + Send + Sync>(
    server_address: &SocketAddr,
    app_state: Option<Arc<T>>,
    configure_app: Option<ConfigFn>,
) -> std::io::Result<()> {
    web::server(move || {
        let mut app = App::new()
            // ==== INTERNAL ==== //
            .route(
                "/internal/probe/readiness",
                get().to(responders::probe::readiness),
            )
            .route(
                "/internal/probe/liveness",
                get().to(responders::probe::liveness),
            )
            .route("/internal/metrics", get().to(responders::metrics::export));

        if let Some(state) = &app_state {
            app = app.state(state.clone());
        }

        if let Some(config) = &configure_app {
            app = app.configure(config);
        }

        app
    })
    .bind(server_address)?
    .run()
    .await
}
