use anyhow::{anyhow, Result};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;

/// Level used when `RUST_LOG` is not set.
const DEFAULT_LEVEL: &str = "info";

/// Installs the global JSON subscriber. `RUST_LOG` narrows or widens what is emitted,
/// e.g. `RUST_LOG=sales_forecast=debug` shows model selection decisions.
pub fn init_logs() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let subscriber = fmt::Subscriber::builder()
        .json()
        .flatten_event(true)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_env_filter(env_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Setting default subscriber: {}", e))
}
