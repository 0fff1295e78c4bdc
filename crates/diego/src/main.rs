//! diego - container start/stop watcher
//!
//! Polls a container executor (docker or podman) and logs every container
//! that starts or stops, optionally exporting the counts to Prometheus.
//! Any error is fatal; run it under a supervisor that restarts it.

use anyhow::Result;
use clap::Parser;
use crate::config::{normalize_args, Cli, LogFormat, Settings};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(cli.log_format.unwrap_or_default());
            error!(error = format!("{e:#}"), "Invalid configuration");
            std::process::exit(1);
        }
    };

    init_tracing(settings.log_format);

    let watch_config = match settings.watch_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = format!("{e:#}"), "Invalid configuration");
            std::process::exit(1);
        }
    };

    match diego_lib::run(watch_config, VERSION).await {
        Ok(never) => match never {},
        Err(e) => {
            error!(error = %e, category = ?e.category(), "Watcher stopped");
            std::process::exit(1);
        }
    }
}

/// Initialize tracing with an env filter, defaulting to `info`
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => {
            // keep escape codes out of the JSON messages
            colored::control::set_override(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init()
        }
    }
}
