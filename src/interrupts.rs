use anyhow::{Context, Result};
use std::panic;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Runs `func` on panic, before the default hook prints the panic message.
pub fn on_panic<F>(func: F)
where
    F: Fn(&panic::PanicHookInfo) + Send + Sync + 'static,
{
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        func(panic_info);
        default_hook(panic_info);
    }));
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
pub async fn shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("Listening for SIGTERM")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Listening for SIGINT")?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

#[cfg(windows)]
pub async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Listening for ctrl+c")?;

    Ok("ctrl+c")
}
