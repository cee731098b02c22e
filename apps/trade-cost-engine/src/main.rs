//! Trade Cost Engine Binary
//!
//! Starts ingestion, the per-symbol compute loops, and the stream
//! server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trade-cost-engine
//! ```
//!
//! # Environment Variables (all optional)
//!
//! - `COST_ENGINE_SYMBOLS`: comma-separated symbols (default: BTC-USDT-SWAP)
//! - `COST_ENGINE_FEED_URL_TEMPLATE`: WebSocket URL with `{symbol}` placeholder
//! - `COST_ENGINE_HTTP_PORT`: stream/health port (default: 8080)
//! - `COST_ENGINE_COMPUTE_INTERVAL_MS`: compute cadence (default: 1000)
//! - `COST_ENGINE_QUANTITY_USD`, `COST_ENGINE_VOLATILITY`,
//!   `COST_ENGINE_FEE_TIER`, `COST_ENGINE_RISK_AVERSION`,
//!   `COST_ENGINE_TIME_HORIZON`, `COST_ENGINE_TIME_STEPS`: model params
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio_util::sync::CancellationToken;

use trade_cost_engine::application::engine::Engine;
use trade_cost_engine::application::pipeline::CostModels;
use trade_cost_engine::infrastructure::config::EngineConfig;
use trade_cost_engine::infrastructure::feed::IngestManager;
use trade_cost_engine::infrastructure::publish::http::{StreamServer, StreamServerState};
use trade_cost_engine::infrastructure::publish::{HubConfig, StreamHub};
use trade_cost_engine::infrastructure::telemetry;
use trade_cost_engine::init_metrics;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("starting trade cost engine");

    let _metrics_handle = init_metrics();

    let config = EngineConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let hub = Arc::new(StreamHub::new(HubConfig::from(config.channels)));

    let manager = Arc::new(IngestManager::new(
        config.feed.clone(),
        Arc::clone(&hub),
        shutdown_token.clone(),
    ));

    let engine = Arc::new(Engine::new(
        Arc::clone(&manager),
        Arc::clone(&hub),
        CostModels::default(),
        config.params.clone(),
        config.compute.interval,
        shutdown_token.clone(),
    ));

    for symbol in &config.symbols {
        engine.activate(symbol);
    }

    let server_state = Arc::new(StreamServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&hub),
        Arc::clone(&engine),
    ));
    let server = StreamServer::new(
        config.server.port,
        server_state,
        shutdown_token.clone(),
    );

    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!(error = %e, "stream server error");
        }
    });

    tracing::info!("trade cost engine ready");

    await_shutdown(shutdown_token).await;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, engine.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("shutdown timed out, exiting anyway");
    }

    tracing::info!("trade cost engine stopped");
    Ok(())
}

/// Load `.env` if present; absence is not an error.
fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
}

fn log_config(config: &EngineConfig) {
    tracing::info!(
        symbols = ?config.symbols,
        http_port = config.server.port,
        compute_interval_ms = config.compute.interval.as_millis(),
        ping_interval_s = config.feed.liveness.ping_interval.as_secs(),
        reconnect_delay_ms = config.feed.reconnect_delay.as_millis(),
        quantity_usd = config.params.quantity_usd,
        volatility = config.params.volatility,
        fee_tier = %config.params.fee_tier,
        "configuration loaded"
    );
}

/// Wait for ctrl-c (or SIGTERM on unix), then trip the shutdown token.
async fn await_shutdown(token: CancellationToken) {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                let _ = signal::ctrl_c().await;
                token.cancel();
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => tracing::info!("received ctrl-c"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        tracing::info!("received ctrl-c");
    }

    token.cancel();
}
