//! Library for watching container executors
//!
//! This crate provides the core functionality for:
//! - Listing running containers through docker or podman
//! - Reconciling each listing against the previously seen containers
//! - Reporting container starts and stops as log lines and Prometheus metrics
//! - Driving all of the above on a fixed poll interval

pub mod api;
pub mod error;
pub mod executor;
pub mod models;
pub mod observability;
pub mod reconciler;
pub mod scheduler;
pub mod sink;

pub use error::{ErrorCategory, Result, WatchError};
pub use executor::{create_executor, ContainerExecutor, ExecutorKind};
pub use models::*;
pub use observability::{StructuredLogger, WatchMetrics};
pub use reconciler::{Reconciler, TrackedSet};
pub use scheduler::{run, watch, Scheduler, SchedulerBuilder, WatchConfig};
pub use sink::{EventSink, ReportingSink};
