use anyhow::{Context, Result};
use clap::Parser;
use interrupts::{on_panic, shutdown_signal};
use logs::init_logs;
use sales_forecast::config::Config;
use sales_forecast::metrics::init_metrics;
use sales_forecast::models::Capabilities;
use sales_forecast::service::Forecaster;
use sales_forecast::source::Ledger;
use server::{configure_api, start_server};
use std::sync::Arc;
use tracing::{error, info};

mod interrupts;
mod logs;
mod server;

const SERVICE_NAME: &str = "sales_forecast";

#[ntex::main]
async fn main() -> Result<()> {
    // A missing .env file is fine, the environment and flags still apply.
    dotenv::dotenv().ok();

    init_logs()?;

    let config = Config::parse();

    on_panic(|panic_info| error!(error = %panic_info, "Panic detected!!"));

    init_metrics(SERVICE_NAME).context("Initializing metrics")?;

    let ledger = Ledger::load(&config.sales_file)?;
    info!(
        "Loaded {} products and {} sale records from {}",
        ledger.products.len(),
        ledger.sales.len(),
        config.sales_file.display()
    );

    let capabilities = if config.disable_numeric {
        Capabilities::degraded()
    } else {
        Capabilities::detect()
    };
    info!("Numeric estimators available: {}", capabilities.numeric);

    let forecaster = Arc::new(Forecaster::new(
        ledger,
        config.forecast_config(),
        capabilities,
    ));

    ntex::rt::spawn(async {
        match shutdown_signal().await {
            Ok(signal) => {
                info!("Received {}, shutting down", signal);
                std::process::exit(0);
            }
            Err(e) => error!("Failed to listen for shutdown signals: {:#}", e),
        }
    });

    info!("Starting server at {}", &config.server_address);
    start_server(&config.server_address, Some(forecaster), Some(configure_api))
        .await
        .context("Running server")?;

    Ok(())
}
