//! Ingestion Manager
//!
//! Owns the per-symbol feed registry: for every subscribed symbol,
//! one latest-tick slot, one shared status cell, and one supervised
//! connection task. The registry is explicit state owned by the
//! manager and handed to collaborators by reference; nothing here is
//! process-global.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::orderbook::OrderBookTick;
use crate::infrastructure::config::FeedSettings;
use crate::infrastructure::publish::StreamHub;

use super::client::{FeedClient, FeedClientConfig, FeedStatus};
use super::slot::LatestSlot;

struct FeedTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SymbolFeed {
    slot: Arc<LatestSlot<OrderBookTick>>,
    status: Arc<FeedStatus>,
    task: Option<FeedTask>,
}

impl SymbolFeed {
    fn has_live_task(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.handle.is_finished())
    }
}

/// Supervisor for all per-symbol ingestion loops.
pub struct IngestManager {
    settings: FeedSettings,
    hub: Arc<StreamHub>,
    shutdown: CancellationToken,
    registry: Mutex<HashMap<String, SymbolFeed>>,
}

impl IngestManager {
    /// Create a manager publishing raw ticks into `hub`. Every spawned
    /// task lives under a child of `shutdown`.
    #[must_use]
    pub fn new(settings: FeedSettings, hub: Arc<StreamHub>, shutdown: CancellationToken) -> Self {
        Self {
            settings,
            hub,
            shutdown,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Start ingestion for a symbol. Idempotent: when a live
    /// connection task already exists, nothing is spawned. Safe to
    /// call repeatedly and concurrently.
    pub fn subscribe(&self, symbol: &str) {
        let mut registry = self.registry.lock();
        let entry = registry.entry(symbol.to_string()).or_default();

        if entry.has_live_task() {
            return;
        }

        let cancel = self.shutdown.child_token();
        let client = FeedClient::new(
            symbol.to_string(),
            FeedClientConfig {
                url: self.settings.url_for(symbol),
                liveness: self.settings.liveness.clone(),
                reconnect_delay: self.settings.reconnect_delay,
            },
            Arc::clone(&entry.slot),
            Arc::clone(&self.hub),
            Arc::clone(&entry.status),
            cancel.clone(),
        );

        tracing::info!(symbol, "starting order-book ingestion");
        let handle = tokio::spawn(client.run());
        entry.task = Some(FeedTask { cancel, handle });
    }

    /// The latest-tick slot for a symbol, created if absent. Creating
    /// the slot does not start ingestion.
    #[must_use]
    pub fn slot(&self, symbol: &str) -> Arc<LatestSlot<OrderBookTick>> {
        let mut registry = self.registry.lock();
        Arc::clone(&registry.entry(symbol.to_string()).or_default().slot)
    }

    /// The shared status cell for a symbol, if known.
    #[must_use]
    pub fn status(&self, symbol: &str) -> Option<Arc<FeedStatus>> {
        self.registry.lock().get(symbol).map(|f| Arc::clone(&f.status))
    }

    /// Whether a live connection task exists for the symbol.
    #[must_use]
    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.registry
            .lock()
            .get(symbol)
            .is_some_and(SymbolFeed::has_live_task)
    }

    /// Number of symbols with a live connection task.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.registry
            .lock()
            .values()
            .filter(|f| f.has_live_task())
            .count()
    }

    /// All registered symbols with their status cells, sorted.
    #[must_use]
    pub fn statuses(&self) -> Vec<(String, Arc<FeedStatus>)> {
        let registry = self.registry.lock();
        let mut out: Vec<_> = registry
            .iter()
            .map(|(symbol, feed)| (symbol.clone(), Arc::clone(&feed.status)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Stop ingestion for one symbol. The slot stays registered and
    /// simply stops updating.
    pub fn unsubscribe(&self, symbol: &str) {
        let task = {
            let mut registry = self.registry.lock();
            registry.get_mut(symbol).and_then(|f| f.task.take())
        };
        if let Some(task) = task {
            tracing::info!(symbol, "stopping order-book ingestion");
            task.cancel.cancel();
        }
    }

    /// Cancel every connection task and wait for all of them to exit.
    pub async fn shutdown(&self) {
        let tasks: Vec<FeedTask> = {
            let mut registry = self.registry.lock();
            registry.values_mut().filter_map(|f| f.task.take()).collect()
        };

        for task in &tasks {
            task.cancel.cancel();
        }
        for task in tasks {
            let _ = task.handle.await;
        }
        tracing::info!("ingestion manager stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> IngestManager {
        // Unroutable endpoint: tasks spin in their reconnect loop,
        // which is all these tests need.
        let settings = FeedSettings {
            url_template: "ws://127.0.0.1:9/{symbol}".to_string(),
            ..Default::default()
        };
        IngestManager::new(
            settings,
            Arc::new(StreamHub::with_defaults()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn subscribe_is_idempotent() {
        let manager = manager();
        manager.subscribe("BTC-USDT-SWAP");
        manager.subscribe("BTC-USDT-SWAP");
        manager.subscribe("BTC-USDT-SWAP");
        assert_eq!(manager.active_connections(), 1);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn distinct_symbols_get_distinct_tasks() {
        let manager = manager();
        manager.subscribe("BTC-USDT-SWAP");
        manager.subscribe("ETH-USDT-SWAP");
        assert_eq!(manager.active_connections(), 2);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn slot_creation_does_not_start_ingestion() {
        let manager = manager();
        let slot = manager.slot("BTC-USDT-SWAP");
        assert!(slot.is_empty());
        assert!(!manager.is_subscribed("BTC-USDT-SWAP"));
        assert_eq!(manager.active_connections(), 0);
    }

    #[tokio::test]
    async fn subscribe_reuses_a_preexisting_slot() {
        let manager = manager();
        let before = manager.slot("BTC-USDT-SWAP");
        manager.subscribe("BTC-USDT-SWAP");
        let after = manager.slot("BTC-USDT-SWAP");
        assert!(Arc::ptr_eq(&before, &after));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_all_tasks() {
        let manager = manager();
        manager.subscribe("BTC-USDT-SWAP");
        manager.subscribe("ETH-USDT-SWAP");
        manager.shutdown().await;
        assert_eq!(manager.active_connections(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_keeps_the_slot_registered() {
        let manager = manager();
        manager.subscribe("BTC-USDT-SWAP");
        let slot = manager.slot("BTC-USDT-SWAP");
        manager.unsubscribe("BTC-USDT-SWAP");
        // Status cell survives; slot simply stops updating.
        assert!(manager.status("BTC-USDT-SWAP").is_some());
        assert!(slot.is_empty());
    }
}
