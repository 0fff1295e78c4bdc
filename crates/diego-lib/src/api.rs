//! HTTP endpoint for Prometheus metrics

use crate::error::{Result, WatchError};
use crate::observability::WatchMetrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metrics: WatchMetrics,
}

impl AppState {
    pub fn new(metrics: WatchMetrics) -> Self {
        Self { metrics }
    }
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Bind the metrics listener on all interfaces
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .map_err(|source| WatchError::MetricsBind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve the metrics endpoint on an already bound listener
///
/// Only returns if the server fails.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let app = create_router(state);

    axum::serve(listener, app)
        .await
        .map_err(WatchError::MetricsServer)
}
