#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::default_trait_access
    )
)]

//! Trade Cost Engine - Live Order-Book Cost Estimation
//!
//! Maintains one WebSocket connection per trading symbol, converts
//! each order-book tick into trading-cost estimates (slippage, fees,
//! Almgren-Chriss market impact, maker/taker split) plus an optimal
//! execution trajectory, and fans the results out to any number of
//! line-delimited stream consumers.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Pure types and math
//!   - `orderbook`: L2 snapshot types
//!   - `costmodel`: fee schedule, slippage, impact, maker/taker,
//!     execution trajectory
//!
//! - **Application**: Use cases
//!   - `pipeline`: the tick + params -> metrics computation
//!   - `timer`: internal latency measurement
//!   - `engine`: per-symbol compute loops over the latest-tick slots
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: WebSocket ingestion with liveness probing and
//!     fixed-delay reconnection
//!   - `publish`: per-symbol fan-out hub and the NDJSON/health HTTP
//!     boundary
//!   - `config`: environment-driven settings
//!   - `telemetry` / `metrics`: tracing and Prometheus
//!
//! # Data Flow
//!
//! ```text
//! venue WS (one per symbol)
//!      │ frame
//!      ▼
//!  TickCodec ──► LatestSlot (overwrite) ──► compute loop ──► StreamHub ──► consumer 1
//!      │                                        │                     ╰──► consumer N
//!      ╰──────────── raw-tick fan-out ──────────┴────────► /stream/{symbol}[...]
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure order-book and cost-model types.
pub mod domain;

/// Application layer - Pipeline, timer, and compute loops.
pub mod application;

/// Infrastructure layer - Feed, publishing, config, observability.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::costmodel::{
    CostModelError, CostModelParams, FeeRates, FeeSchedule, FeeTier, ImpactParams, LiquidityRole,
    MakerTakerModel, MetricsResult, SlippageModel, TrajectoryPoint, optimal_trajectory,
};
pub use domain::orderbook::{BookLevel, OrderBookTick};

// Application
pub use application::engine::{Engine, SymbolReport};
pub use application::pipeline::{CostModels, CostPipeline};
pub use application::timer::LatencyTimer;

// Infrastructure config
pub use infrastructure::config::{
    ChannelSettings, ComputeSettings, ConfigError, EngineConfig, FeedSettings, ServerSettings,
};

// Feed (for integration tests)
pub use infrastructure::feed::{
    FeedClient, FeedClientConfig, FeedConnectionState, FeedStatus, IngestManager, LatestSlot,
    LivenessConfig, ReconnectPolicy, TickCodec,
};

// Publishing (for integration tests)
pub use infrastructure::publish::{
    HubConfig, MetricsEvent, StreamHub, TickEvent,
    http::{StreamServer, StreamServerState},
};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryGuard, init as init_telemetry};
