//! Stream and Health Endpoints
//!
//! HTTP boundary of the engine. The excluded UI layer consumes these
//! routes; nothing here knows about rendering.
//!
//! # Endpoints
//!
//! - `GET /stream/{symbol}` - one NDJSON line per new raw tick:
//!   `{"data": <tick>, "timestamp": <unix seconds>}`
//! - `GET /stream/{symbol}/metrics` - one NDJSON line per computed
//!   metrics set
//! - `GET /health` - JSON status with per-symbol feed/compute counters
//! - `GET /healthz` - liveness probe (simple OK)
//! - `GET /readyz` - readiness probe (at least one feed connected)
//! - `GET /metrics` - Prometheus metrics in text format
//!
//! Requesting a stream for a new symbol activates it (idempotently),
//! so one registration per symbol is all a consumer ever needs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;

use crate::application::engine::Engine;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::publish::StreamHub;

/// Errors from the stream server.
#[derive(Debug, thiserror::Error)]
pub enum StreamServerError {
    /// Could not bind the listen port.
    #[error("failed to bind port {0}: {1}")]
    BindFailed(u16, String),
    /// Serving failed.
    #[error("server failed: {0}")]
    ServerFailed(String),
}

/// Shared state behind the HTTP routes.
pub struct StreamServerState {
    /// Service version reported by `/health`.
    pub version: String,
    /// Startup instant for uptime reporting.
    pub started_at: Instant,
    /// Fan-out hub the stream routes subscribe to.
    pub hub: Arc<StreamHub>,
    /// Engine used for activation and status.
    pub engine: Arc<Engine>,
}

impl StreamServerState {
    /// Create server state.
    #[must_use]
    pub fn new(version: String, hub: Arc<StreamHub>, engine: Arc<Engine>) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            hub,
            engine,
        }
    }
}

/// HTTP server exposing the stream boundary and health routes.
pub struct StreamServer {
    port: u16,
    state: Arc<StreamServerState>,
    cancel: CancellationToken,
}

impl StreamServer {
    /// Create a server on the given port.
    #[must_use]
    pub const fn new(port: u16, state: Arc<StreamServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Build the router; exposed separately for in-process tests.
    #[must_use]
    pub fn router(state: Arc<StreamServerState>) -> Router {
        Router::new()
            .route("/stream/{symbol}", get(tick_stream_handler))
            .route("/stream/{symbol}/metrics", get(metrics_stream_handler))
            .route("/health", get(health_handler))
            .route("/healthz", get(liveness_handler))
            .route("/readyz", get(readiness_handler))
            .route("/metrics", get(prometheus_handler))
            .with_state(state)
    }

    /// Bind and serve until the cancellation token fires.
    ///
    /// # Errors
    ///
    /// Returns [`StreamServerError`] when binding or serving fails.
    pub async fn run(self) -> Result<(), StreamServerError> {
        let app = Self::router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StreamServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "stream server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| StreamServerError::ServerFailed(e.to_string()))?;

        tracing::info!("stream server stopped");
        Ok(())
    }
}

// =============================================================================
// Stream Handlers
// =============================================================================

async fn tick_stream_handler(
    Path(symbol): Path<String>,
    State(state): State<Arc<StreamServerState>>,
) -> Response {
    state.engine.activate(&symbol);
    ndjson_response(state.hub.subscribe_ticks(&symbol))
}

async fn metrics_stream_handler(
    Path(symbol): Path<String>,
    State(state): State<Arc<StreamServerState>>,
) -> Response {
    state.engine.activate(&symbol);
    ndjson_response(state.hub.subscribe_metrics(&symbol))
}

/// Turn a broadcast receiver into a line-delimited JSON body. A
/// lagging consumer silently skips the events it missed; only its own
/// cursor is affected.
fn ndjson_response<T>(rx: broadcast::Receiver<T>) -> Response
where
    T: Serialize + Clone + Send + 'static,
{
    let lines = BroadcastStream::new(rx).filter_map(|item| match item {
        Ok(event) => serde_json::to_vec(&event).ok().map(|mut line| {
            line.push(b'\n');
            Ok::<Bytes, std::convert::Infallible>(Bytes::from(line))
        }),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "stream consumer lagged");
            None
        }
    });

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response()
}

// =============================================================================
// Health Handlers
// =============================================================================

/// Health payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Per-symbol feed and compute status.
    pub symbols: Vec<SymbolStatus>,
    /// Total stream consumers across all symbols.
    pub stream_consumers: usize,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every symbol's feed is connected.
    Healthy,
    /// Some feeds are connected.
    Degraded,
    /// No feed is connected.
    Unhealthy,
}

/// Per-symbol section of the health payload.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolStatus {
    /// Symbol name.
    pub symbol: String,
    /// Connection state name.
    pub connection: &'static str,
    /// Whether the feed is live.
    pub connected: bool,
    /// Frames decoded.
    pub frames_received: u64,
    /// Undecodable frames dropped.
    pub frames_dropped: u64,
    /// Reconnect attempts.
    pub reconnects: u64,
    /// Successful computations.
    pub computes: u64,
    /// Ticks rejected by the pipeline.
    pub compute_failures: u64,
}

async fn health_handler(State(state): State<Arc<StreamServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<StreamServerState>>) -> impl IntoResponse {
    let any_connected = state.engine.report().iter().any(|r| {
        r.connection == crate::infrastructure::feed::FeedConnectionState::Connected
    });
    if any_connected {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn prometheus_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn build_health_response(state: &StreamServerState) -> HealthResponse {
    use crate::infrastructure::feed::FeedConnectionState;

    let symbols: Vec<SymbolStatus> = state
        .engine
        .report()
        .into_iter()
        .map(|r| SymbolStatus {
            connection: r.connection.as_str(),
            connected: r.connection == FeedConnectionState::Connected,
            frames_received: r.frames_received,
            frames_dropped: r.frames_dropped,
            reconnects: r.reconnects,
            computes: r.computes,
            compute_failures: r.compute_failures,
            symbol: r.symbol,
        })
        .collect();

    let connected = symbols.iter().filter(|s| s.connected).count();
    let status = if symbols.is_empty() || connected == 0 {
        HealthStatus::Unhealthy
    } else if connected == symbols.len() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        symbols,
        stream_consumers: state.hub.total_receivers(),
    }
}
