//! Watcher configuration
//!
//! Values are layered: built-in defaults, then `DIEGO_*` environment
//! variables, then command-line flags.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use diego_lib::WatchConfig;
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::time::Duration;

/// Text printed by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nBuild Date: ",
    env!("DIEGO_BUILD_DATE"),
    "\nGit Commit: ",
    env!("DIEGO_GIT_COMMIT"),
    "\nRust Version: ",
    env!("DIEGO_RUSTC_VERSION"),
    "\nOS / Arch: ",
    env!("DIEGO_TARGET"),
);

/// Watch a container executor and log containers as they start and stop
#[derive(Debug, Parser)]
#[command(name = "diego")]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Container executor to watch: docker or podman [env: DIEGO_EXECUTOR] [default: docker]
    #[arg(long)]
    pub executor: Option<String>,

    /// Poll interval in milliseconds [env: DIEGO_INTERVAL] [default: 1000]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: Option<u32>,

    /// Serve Prometheus metrics [env: DIEGO_PROMETHEUS]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub prometheus: Option<bool>,

    /// Port for the Prometheus metrics server [env: DIEGO_PROMETHEUS_PORT] [default: 8000]
    #[arg(long)]
    pub prometheus_port: Option<u16>,

    /// Log output format [env: DIEGO_LOG_FORMAT] [default: text]
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Rewrite single-dash long flags (`-executor podman`, `-prometheus=true`,
/// `-version`) to their double-dash form so older invocations keep working
///
/// Short flags such as `-V` and anything after `--` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let command = Cli::command();
    let mut long_names: Vec<&str> = command.get_arguments().filter_map(|a| a.get_long()).collect();
    long_names.extend(["help", "version"]);

    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            match single_dash_long(&arg, &long_names) {
                Some(long) => long.into(),
                None => arg,
            }
        })
        .collect()
}

fn single_dash_long(arg: &OsStr, long_names: &[&str]) -> Option<String> {
    let flag = arg.to_str()?;
    let rest = flag.strip_prefix('-')?;
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    (!rest.starts_with('-') && long_names.contains(&name)).then(|| format!("-{flag}"))
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, colored lines (default)
    #[default]
    Text,
    /// One JSON object per line, without colors
    Json,
}

impl LogFormat {
    fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub executor: String,
    /// Milliseconds
    pub interval: u64,
    pub prometheus: bool,
    pub prometheus_port: u16,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment and `cli`
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_from(cli, None)
    }

    /// Load settings, reading `DIEGO_*` variables from `env` instead of the
    /// process environment when given
    pub fn load_from(cli: &Cli, env: Option<config::Map<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("executor", "docker")?
            .set_default("interval", 1000)?
            .set_default("prometheus", false)?
            .set_default("prometheus_port", 8000)?
            .set_default("log_format", LogFormat::default().as_str())?
            .add_source(
                config::Environment::with_prefix("DIEGO")
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("executor", cli.executor.clone())?
            .set_override_option("interval", cli.interval.map(i64::from))?
            .set_override_option("prometheus", cli.prometheus)?
            .set_override_option("prometheus_port", cli.prometheus_port.map(i64::from))?
            .set_override_option("log_format", cli.log_format.map(|f| f.as_str()))?
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Convert into the library's run configuration
    pub fn watch_config(&self) -> Result<WatchConfig> {
        if self.interval == 0 {
            bail!("interval must be at least 1 millisecond");
        }

        Ok(WatchConfig {
            executor: self.executor.clone(),
            interval: Duration::from_millis(self.interval),
            metrics_enabled: self.prometheus,
            metrics_port: self.prometheus_port,
        })
    }
}
