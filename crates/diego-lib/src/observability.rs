//! Observability infrastructure for the watcher
//!
//! Provides:
//! - Prometheus metrics (running containers, per-container gauge, containers seen)
//! - Structured logging with tracing

use crate::error::Result;
use crate::models::ContainerRecord;
use prometheus::{Encoder, IntCounter, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::time::Duration;
use tracing::info;

pub const RUNNING_CONTAINERS_TOTAL: &str = "running_containers_total";
pub const RUNNING_CONTAINERS: &str = "running_containers";
pub const CONTAINERS_SEEN_TOTAL: &str = "containers_seen_total";

/// Label names of the per-container gauge
const CONTAINER_LABELS: &[&str] = &["name", "image", "createdAt"];

/// Watcher metrics for Prometheus exposition
///
/// Each handle owns its registry. Clones share the same instruments, so the
/// poll loop can update them while the metrics endpoint gathers them.
#[derive(Clone)]
pub struct WatchMetrics {
    registry: Registry,
    running_containers_total: IntGauge,
    running_containers: IntGaugeVec,
    containers_seen_total: IntCounter,
}

impl WatchMetrics {
    /// Create the instruments and register them in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let running_containers_total =
            IntGauge::new(RUNNING_CONTAINERS_TOTAL, "Currently running containers")?;
        let running_containers = IntGaugeVec::new(
            Opts::new(RUNNING_CONTAINERS, "Running containers"),
            CONTAINER_LABELS,
        )?;
        let containers_seen_total = IntCounter::new(
            CONTAINERS_SEEN_TOTAL,
            "The number of total containers that ever ran",
        )?;

        registry.register(Box::new(running_containers_total.clone()))?;
        registry.register(Box::new(running_containers.clone()))?;
        registry.register(Box::new(containers_seen_total.clone()))?;

        Ok(Self {
            registry,
            running_containers_total,
            running_containers,
            containers_seen_total,
        })
    }

    /// Record a container that started
    pub fn record_started(&self, container: &ContainerRecord) {
        self.running_containers_total.inc();
        self.containers_seen_total.inc();
        self.container_gauge(container).inc();
    }

    /// Record a container that stopped
    pub fn record_stopped(&self, container: &ContainerRecord) {
        self.running_containers_total.dec();
        self.container_gauge(container).dec();
    }

    // Keyed by labels, not id: containers sharing name, image and creation
    // time share one series.
    fn container_gauge(&self, container: &ContainerRecord) -> IntGauge {
        self.running_containers.with_label_values(&[
            container.names.as_str(),
            container.image.as_str(),
            container.created_at.as_str(),
        ])
    }

    pub fn running(&self) -> i64 {
        self.running_containers_total.get()
    }

    pub fn seen(&self) -> u64 {
        self.containers_seen_total.get()
    }

    /// Current value of the per-container gauge for these labels
    pub fn running_with_labels(&self, name: &str, image: &str, created_at: &str) -> i64 {
        self.running_containers
            .with_label_values(&[name, image, created_at])
            .get()
    }

    /// Encode all instruments in the Prometheus text format
    pub fn encode(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

/// Structured logger for watcher lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    executor: String,
}

impl StructuredLogger {
    pub fn new(executor: impl Into<String>) -> Self {
        Self {
            executor: executor.into(),
        }
    }

    /// Log watcher startup
    pub fn log_startup(&self, version: &str, interval: Duration, metrics_enabled: bool) {
        info!(
            event = "watcher_started",
            executor = %self.executor,
            version = %version,
            interval_ms = interval.as_millis() as u64,
            metrics_enabled = metrics_enabled,
            "Watching {} containers",
            self.executor
        );
    }

    /// Log the metrics endpoint coming up
    pub fn log_metrics_server(&self, addr: &str) {
        info!(
            event = "metrics_server_started",
            addr = %addr,
            "Prometheus metrics server running on {}",
            addr
        );
    }
}
