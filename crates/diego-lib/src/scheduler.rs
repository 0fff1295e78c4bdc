//! Poll loop
//!
//! Runs observe -> reconcile -> report on a fixed interval, forever. The
//! first error from the executor ends the loop; restarts are left to
//! whatever supervises the process.

use crate::api::{self, AppState};
use crate::error::{Result, WatchError};
use crate::executor::{create_executor, ContainerExecutor, ExecutorKind};
use crate::models::Transition;
use crate::observability::{StructuredLogger, WatchMetrics};
use crate::reconciler::{Reconciler, TrackedSet};
use crate::sink::{EventSink, ReportingSink};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for a watch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Executor name, e.g. "docker" or "podman"
    pub executor: String,
    /// Pause between the end of one poll and the start of the next
    pub interval: Duration,
    /// Whether to serve Prometheus metrics
    pub metrics_enabled: bool,
    /// Port for the metrics endpoint
    pub metrics_port: u16,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorKind::Docker.to_string(),
            interval: Duration::from_millis(1000),
            metrics_enabled: false,
            metrics_port: 8000,
        }
    }
}

/// The poll loop: owns the reconciler and drives executor and sink
pub struct Scheduler {
    executor: Arc<dyn ContainerExecutor>,
    reconciler: Reconciler,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        executor: Arc<dyn ContainerExecutor>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            executor,
            reconciler: Reconciler::new(),
            sink,
            interval,
        }
    }

    pub fn tracked(&self) -> &TrackedSet {
        self.reconciler.tracked()
    }

    /// Run a single poll cycle and return the transitions it reported
    pub async fn poll_once(&mut self) -> Result<Vec<Transition>> {
        let observed = self.executor.list_containers().await?;
        let transitions = self.reconciler.reconcile(&observed);

        for transition in &transitions {
            self.sink.report(transition);
        }

        debug!(
            executor = %self.executor.name(),
            running = self.reconciler.tracked().len(),
            changes = transitions.len(),
            "Poll cycle complete"
        );

        Ok(transitions)
    }

    /// Poll until the executor fails
    pub async fn run(mut self) -> Result<Infallible> {
        info!(
            executor = %self.executor.name(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting poll loop"
        );

        loop {
            self.poll_once().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Builder for the poll loop
pub struct SchedulerBuilder {
    executor: Arc<dyn ContainerExecutor>,
    sink: Option<Arc<dyn EventSink>>,
    interval: Duration,
}

impl SchedulerBuilder {
    /// Create a builder that logs transitions and polls every second
    pub fn new(executor: Arc<dyn ContainerExecutor>) -> Self {
        Self {
            executor,
            sink: None,
            interval: WatchConfig::default().interval,
        }
    }

    /// Set the transition sink
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the poll interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn build(self) -> Scheduler {
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(ReportingSink::new()));

        Scheduler::new(self.executor, sink, self.interval)
    }
}

/// Watch the executor named in `config` until something fails
pub async fn run(config: WatchConfig, version: &str) -> Result<Infallible> {
    let kind: ExecutorKind = config.executor.parse()?;
    watch(create_executor(kind), config, version).await
}

/// Watch an executor, serving metrics alongside when enabled
///
/// With metrics on, the listener is bound before the first poll and the
/// server runs on its own task. Whichever of the two stops first decides
/// the error.
pub async fn watch(
    executor: Arc<dyn ContainerExecutor>,
    config: WatchConfig,
    version: &str,
) -> Result<Infallible> {
    let logger = StructuredLogger::new(executor.name());
    logger.log_startup(version, config.interval, config.metrics_enabled);

    if !config.metrics_enabled {
        return SchedulerBuilder::new(executor)
            .interval(config.interval)
            .build()
            .run()
            .await;
    }

    let metrics = WatchMetrics::new()?;
    let listener = api::bind(config.metrics_port).await?;
    let addr = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| format!("0.0.0.0:{}", config.metrics_port));
    logger.log_metrics_server(&addr);

    let server = tokio::spawn(api::serve(
        listener,
        Arc::new(AppState::new(metrics.clone())),
    ));

    let scheduler = SchedulerBuilder::new(executor)
        .sink(Arc::new(ReportingSink::with_metrics(metrics)))
        .interval(config.interval)
        .build();

    tokio::select! {
        result = scheduler.run() => result,
        joined = server => match joined {
            Ok(Err(e)) => Err(e),
            Ok(Ok(())) | Err(_) => Err(WatchError::MetricsServerExited),
        },
    }
}
