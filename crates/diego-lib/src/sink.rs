//! Transition reporting
//!
//! Every transition becomes a colored log line; when metrics are enabled the
//! Prometheus instruments are updated as well.

use crate::models::{Transition, TransitionKind};
use crate::observability::WatchMetrics;
use colored::{ColoredString, Colorize};
use tracing::info;

/// Consumer of container transitions
///
/// Reporting never fails; implementations swallow or log their own problems.
pub trait EventSink: Send + Sync {
    fn report(&self, transition: &Transition);
}

/// Default sink: console log plus optional Prometheus metrics
#[derive(Clone, Default)]
pub struct ReportingSink {
    metrics: Option<WatchMetrics>,
}

impl ReportingSink {
    /// Sink that only logs
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that logs and updates `metrics`
    pub fn with_metrics(metrics: WatchMetrics) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    pub fn metrics(&self) -> Option<&WatchMetrics> {
        self.metrics.as_ref()
    }
}

impl EventSink for ReportingSink {
    fn report(&self, transition: &Transition) {
        let record = &transition.record;

        info!(
            event = event_name(transition.kind),
            container_id = %record.id,
            name = %record.display_name(),
            image = %record.image,
            created_at = %record.created_at,
            "{}",
            format_transition(transition)
        );

        if let Some(metrics) = &self.metrics {
            match transition.kind {
                TransitionKind::Started => metrics.record_started(record),
                TransitionKind::Stopped => metrics.record_stopped(record),
            }
        }
    }
}

fn event_name(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Started => "container_started",
        TransitionKind::Stopped => "container_stopped",
    }
}

/// Render `<name> - <image> <started|stopped>`
///
/// Colors follow `colored`'s global switch, so they disappear when ANSI
/// output is turned off.
pub fn format_transition(transition: &Transition) -> String {
    let record = &transition.record;
    format!(
        "{} - {} {}",
        record.display_name().cyan().bold(),
        record.image.cyan(),
        kind_label(transition.kind)
    )
}

fn kind_label(kind: TransitionKind) -> ColoredString {
    match kind {
        TransitionKind::Started => kind.as_str().green(),
        TransitionKind::Stopped => kind.as_str().red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContainerRecord;

    fn record(id: &str, names: &str) -> ContainerRecord {
        ContainerRecord {
            id: id.to_string(),
            command: "node server.js".to_string(),
            image: "node:20".to_string(),
            names: names.to_string(),
            status: "Up".to_string(),
            created_at: "2024-02-02 12:00:00 +0000 UTC".to_string(),
            started_at: None,
        }
    }

    #[test]
    fn test_format_transition() {
        let started = Transition::started(record("a", "api"));
        let expected = format!("{} - {} {}", "api".cyan().bold(), "node:20".cyan(), "started".green());
        assert_eq!(format_transition(&started), expected);

        let stopped = Transition::stopped(record("0123456789abcdef", ""));
        let expected = format!(
            "{} - {} {}",
            "0123456789ab".cyan().bold(),
            "node:20".cyan(),
            "stopped".red()
        );
        assert_eq!(format_transition(&stopped), expected);
    }

    #[test]
    fn test_sink_updates_metrics() {
        let metrics = WatchMetrics::new().unwrap();
        let sink = ReportingSink::with_metrics(metrics.clone());

        sink.report(&Transition::started(record("a", "api")));
        sink.report(&Transition::started(record("b", "worker")));
        sink.report(&Transition::stopped(record("a", "api")));

        assert_eq!(metrics.running(), 1);
        assert_eq!(metrics.seen(), 2);
        assert_eq!(
            metrics.running_with_labels("worker", "node:20", "2024-02-02 12:00:00 +0000 UTC"),
            1
        );
    }

    #[test]
    fn test_sink_without_metrics() {
        let sink = ReportingSink::new();
        assert!(sink.metrics().is_none());

        sink.report(&Transition::started(record("a", "api")));
        sink.report(&Transition::stopped(record("a", "api")));
    }
}
