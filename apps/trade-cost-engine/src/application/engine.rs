//! Per-symbol compute loops.
//!
//! For every active symbol the engine runs one periodic loop that
//! drains the symbol's latest-tick slot, runs the cost pipeline, and
//! publishes the result. An empty slot means the loop idles for that
//! interval; a pipeline failure is logged and counted, never fatal.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::pipeline::{CostModels, CostPipeline};
use crate::domain::costmodel::CostModelParams;
use crate::domain::orderbook::OrderBookTick;
use crate::infrastructure::feed::{FeedConnectionState, IngestManager, LatestSlot};
use crate::infrastructure::metrics as prom;
use crate::infrastructure::publish::StreamHub;

/// Computation counters for one symbol's loop.
#[derive(Debug, Default)]
pub struct ComputeStats {
    computes: AtomicU64,
    failures: AtomicU64,
}

impl ComputeStats {
    /// Successful computations.
    pub fn computes(&self) -> u64 {
        self.computes.load(Ordering::Relaxed)
    }

    /// Ticks rejected by the pipeline.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn record_compute(&self) {
        self.computes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of one symbol for status payloads.
///
/// Carries enough for a polling consumer to distinguish "stream has
/// no data yet" (not connected, or zero frames) from "ticks are being
/// rejected" (failures climbing while frames arrive).
#[derive(Debug, Clone)]
pub struct SymbolReport {
    /// Symbol name.
    pub symbol: String,
    /// Feed connection state.
    pub connection: FeedConnectionState,
    /// Frames decoded from the feed.
    pub frames_received: u64,
    /// Undecodable frames dropped.
    pub frames_dropped: u64,
    /// Reconnect attempts.
    pub reconnects: u64,
    /// Successful metric computations.
    pub computes: u64,
    /// Ticks rejected by the pipeline.
    pub compute_failures: u64,
}

struct SymbolLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    stats: Arc<ComputeStats>,
}

impl SymbolLoop {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Orchestrates ingestion plus one compute loop per active symbol.
pub struct Engine {
    manager: Arc<IngestManager>,
    hub: Arc<StreamHub>,
    models: CostModels,
    params: CostModelParams,
    interval: Duration,
    shutdown: CancellationToken,
    loops: Mutex<HashMap<String, SymbolLoop>>,
}

impl Engine {
    /// Create an engine. `params` and `models` apply to every symbol.
    #[must_use]
    pub fn new(
        manager: Arc<IngestManager>,
        hub: Arc<StreamHub>,
        models: CostModels,
        params: CostModelParams,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            hub,
            models,
            params,
            interval,
            shutdown,
            loops: Mutex::new(HashMap::new()),
        }
    }

    /// Activate a symbol: start ingestion and its compute loop.
    /// Idempotent, like the underlying subscription.
    pub fn activate(&self, symbol: &str) {
        self.manager.subscribe(symbol);

        let mut loops = self.loops.lock();
        if loops.get(symbol).is_some_and(SymbolLoop::is_live) {
            return;
        }

        let stats = Arc::new(ComputeStats::default());
        let cancel = self.shutdown.child_token();
        let handle = tokio::spawn(run_compute_loop(
            symbol.to_string(),
            self.manager.slot(symbol),
            Arc::clone(&self.hub),
            CostPipeline::new(self.models.clone()),
            self.params.clone(),
            self.interval,
            cancel.clone(),
            Arc::clone(&stats),
        ));

        tracing::info!(symbol, interval_ms = self.interval.as_millis(), "compute loop started");
        loops.insert(
            symbol.to_string(),
            SymbolLoop {
                cancel,
                handle,
                stats,
            },
        );
    }

    /// Whether a live compute loop exists for the symbol.
    #[must_use]
    pub fn is_active(&self, symbol: &str) -> bool {
        self.loops.lock().get(symbol).is_some_and(SymbolLoop::is_live)
    }

    /// Number of live compute loops.
    #[must_use]
    pub fn active_loops(&self) -> usize {
        self.loops.lock().values().filter(|l| l.is_live()).count()
    }

    /// Per-symbol status across ingestion and computation.
    #[must_use]
    pub fn report(&self) -> Vec<SymbolReport> {
        let loops = self.loops.lock();
        self.manager
            .statuses()
            .into_iter()
            .map(|(symbol, feed)| {
                let (computes, failures) = loops
                    .get(&symbol)
                    .map_or((0, 0), |l| (l.stats.computes(), l.stats.failures()));
                SymbolReport {
                    connection: feed.state(),
                    frames_received: feed.frames_received(),
                    frames_dropped: feed.frames_dropped(),
                    reconnects: feed.reconnects(),
                    computes,
                    compute_failures: failures,
                    symbol,
                }
            })
            .collect()
    }

    /// Stop every compute loop and all ingestion tasks.
    pub async fn shutdown(&self) {
        let loops: Vec<SymbolLoop> = {
            let mut map = self.loops.lock();
            map.drain().map(|(_, l)| l).collect()
        };
        for l in &loops {
            l.cancel.cancel();
        }
        for l in loops {
            let _ = l.handle.await;
        }
        self.manager.shutdown().await;
        tracing::info!("engine stopped");
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_compute_loop(
    symbol: String,
    slot: Arc<LatestSlot<OrderBookTick>>,
    hub: Arc<StreamHub>,
    mut pipeline: CostPipeline,
    params: CostModelParams,
    interval: Duration,
    cancel: CancellationToken,
    stats: Arc<ComputeStats>,
) {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = timer.tick() => {
                // Nothing new since the last pass: stay idle.
                let Some(tick) = slot.take() else { continue };

                match pipeline.compute(&tick, &params) {
                    Ok(result) => {
                        stats.record_compute();
                        prom::record_compute(&symbol);
                        #[allow(clippy::cast_precision_loss)]
                        let produced_at = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
                        hub.publish_metrics(&symbol, produced_at, result);
                    }
                    Err(e) => {
                        stats.record_failure();
                        prom::record_compute_error(&symbol);
                        tracing::warn!(symbol = %symbol, error = %e, "tick rejected by cost pipeline");
                    }
                }
            }
        }
    }

    tracing::debug!(symbol = %symbol, "compute loop stopped");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::time::timeout;

    use crate::domain::orderbook::BookLevel;
    use crate::infrastructure::config::FeedSettings;

    use super::*;

    fn engine() -> Engine {
        let hub = Arc::new(StreamHub::with_defaults());
        let settings = FeedSettings {
            // Unroutable: ingestion spins in its reconnect loop while
            // these tests feed the slot directly.
            url_template: "ws://127.0.0.1:9/{symbol}".to_string(),
            ..Default::default()
        };
        let manager = Arc::new(IngestManager::new(
            settings,
            Arc::clone(&hub),
            CancellationToken::new(),
        ));
        Engine::new(
            manager,
            hub,
            CostModels::default(),
            CostModelParams::default(),
            Duration::from_millis(10),
            CancellationToken::new(),
        )
    }

    fn sample_tick() -> OrderBookTick {
        OrderBookTick::new(
            vec![BookLevel::new(99.0, 1.0)],
            vec![BookLevel::new(101.0, 2.0)],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn activate_is_idempotent() {
        let engine = engine();
        engine.activate("BTC-USDT-SWAP");
        engine.activate("BTC-USDT-SWAP");
        assert_eq!(engine.active_loops(), 1);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn slot_drain_produces_metrics_events() {
        let engine = engine();
        let mut rx = engine.hub.subscribe_metrics("BTC-USDT-SWAP");

        engine.activate("BTC-USDT-SWAP");
        let _ = engine.manager.slot("BTC-USDT-SWAP").publish(sample_tick());

        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("compute loop should publish within the interval")
            .unwrap();
        assert_eq!(event.symbol, "BTC-USDT-SWAP");
        assert_eq!(event.metrics.maker_proportion, 0.5);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_tick_is_counted_not_fatal() {
        let engine = engine();
        engine.activate("BTC-USDT-SWAP");

        let slot = engine.manager.slot("BTC-USDT-SWAP");
        let _ = slot.publish(OrderBookTick::new(vec![], vec![], Utc::now()));

        // Wait for the loop to drain the bad tick before offering the
        // good one, so the overwrite semantics don't swallow it.
        timeout(Duration::from_secs(2), async {
            while !slot.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        // The loop keeps running and processes the next good tick.
        let mut rx = engine.hub.subscribe_metrics("BTC-USDT-SWAP");
        let _ = slot.publish(sample_tick());
        let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert!(event.metrics.net_cost > 0.0);

        let report = engine.report();
        let symbol = report.iter().find(|r| r.symbol == "BTC-USDT-SWAP").unwrap();
        assert!(symbol.compute_failures >= 1);
        assert!(symbol.computes >= 1);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_loops_and_ingestion() {
        let engine = engine();
        engine.activate("BTC-USDT-SWAP");
        engine.activate("ETH-USDT-SWAP");
        assert_eq!(engine.active_loops(), 2);
        engine.shutdown().await;
        assert_eq!(engine.active_loops(), 0);
        assert_eq!(engine.manager.active_connections(), 0);
    }
}
