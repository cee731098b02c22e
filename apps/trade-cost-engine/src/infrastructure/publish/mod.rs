//! Stream fan-out.
//!
//! Makes each symbol's raw ticks and computed metrics available to
//! any number of independent consumers. Every subscriber owns its own
//! broadcast cursor: a slow consumer lags and drops on its own
//! receiver without ever affecting the producer or its peers.

pub mod http;

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::costmodel::MetricsResult;
use crate::domain::orderbook::OrderBookTick;

/// One raw-tick event on the stream boundary.
///
/// Wire shape: `{"data": <tick>, "timestamp": <unix seconds>}`.
#[derive(Debug, Clone, Serialize)]
pub struct TickEvent {
    /// The order-book snapshot.
    pub data: OrderBookTick,
    /// Unix epoch seconds (fractional) the tick was received.
    pub timestamp: f64,
}

/// One computed-metrics event on the stream boundary.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsEvent {
    /// Symbol the metrics were computed for.
    pub symbol: String,
    /// Unix epoch seconds (fractional) the result was produced.
    pub timestamp: f64,
    /// The computed metrics set.
    pub metrics: MetricsResult,
}

/// Channel capacities for the hub.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity of each per-symbol tick channel.
    pub ticks_capacity: usize,
    /// Capacity of each per-symbol metrics channel.
    pub metrics_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ticks_capacity: 256,
            metrics_capacity: 256,
        }
    }
}

impl From<crate::infrastructure::config::ChannelSettings> for HubConfig {
    fn from(settings: crate::infrastructure::config::ChannelSettings) -> Self {
        Self {
            ticks_capacity: settings.ticks_capacity,
            metrics_capacity: settings.metrics_capacity,
        }
    }
}

struct SymbolChannels {
    ticks: broadcast::Sender<TickEvent>,
    metrics: broadcast::Sender<MetricsEvent>,
}

/// Per-symbol broadcast hub.
///
/// Channels are created lazily on first publish or subscribe, so a
/// consumer may attach before the first tick ever arrives.
pub struct StreamHub {
    config: HubConfig,
    channels: RwLock<HashMap<String, SymbolChannels>>,
}

impl StreamHub {
    /// Hub with explicit capacities.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Hub with default capacities.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(HubConfig::default())
    }

    /// Publish a raw tick. Returns the number of consumers reached.
    pub fn publish_tick(&self, symbol: &str, tick: OrderBookTick) -> usize {
        let event = TickEvent {
            timestamp: tick.received_at_epoch(),
            data: tick,
        };
        self.with_channels(symbol, |ch| ch.ticks.send(event).unwrap_or(0))
    }

    /// Publish a computed metrics set. Returns the number of
    /// consumers reached.
    pub fn publish_metrics(&self, symbol: &str, timestamp: f64, metrics: MetricsResult) -> usize {
        let event = MetricsEvent {
            symbol: symbol.to_string(),
            timestamp,
            metrics,
        };
        self.with_channels(symbol, |ch| ch.metrics.send(event).unwrap_or(0))
    }

    /// New receiver for a symbol's raw ticks.
    #[must_use]
    pub fn subscribe_ticks(&self, symbol: &str) -> broadcast::Receiver<TickEvent> {
        self.with_channels(symbol, |ch| ch.ticks.subscribe())
    }

    /// New receiver for a symbol's computed metrics.
    #[must_use]
    pub fn subscribe_metrics(&self, symbol: &str) -> broadcast::Receiver<MetricsEvent> {
        self.with_channels(symbol, |ch| ch.metrics.subscribe())
    }

    /// Active tick receivers for a symbol.
    #[must_use]
    pub fn tick_receiver_count(&self, symbol: &str) -> usize {
        self.channels
            .read()
            .get(symbol)
            .map_or(0, |ch| ch.ticks.receiver_count())
    }

    /// Active metrics receivers for a symbol.
    #[must_use]
    pub fn metrics_receiver_count(&self, symbol: &str) -> usize {
        self.channels
            .read()
            .get(symbol)
            .map_or(0, |ch| ch.metrics.receiver_count())
    }

    /// Total receivers across all symbols and both channel kinds.
    #[must_use]
    pub fn total_receivers(&self) -> usize {
        self.channels
            .read()
            .values()
            .map(|ch| ch.ticks.receiver_count() + ch.metrics.receiver_count())
            .sum()
    }

    fn with_channels<R>(&self, symbol: &str, f: impl FnOnce(&SymbolChannels) -> R) -> R {
        {
            let channels = self.channels.read();
            if let Some(ch) = channels.get(symbol) {
                return f(ch);
            }
        }

        let mut channels = self.channels.write();
        let ch = channels
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolChannels {
                ticks: broadcast::channel(self.config.ticks_capacity).0,
                metrics: broadcast::channel(self.config.metrics_capacity).0,
            });
        f(ch)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::orderbook::BookLevel;

    use super::*;

    fn sample_tick() -> OrderBookTick {
        OrderBookTick::new(
            vec![BookLevel::new(99.0, 1.0)],
            vec![BookLevel::new(101.0, 2.0)],
            Utc::now(),
        )
    }

    #[test]
    fn publish_without_consumers_reaches_nobody() {
        let hub = StreamHub::with_defaults();
        assert_eq!(hub.publish_tick("BTC", sample_tick()), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_published_tick() {
        let hub = StreamHub::with_defaults();
        let mut rx = hub.subscribe_ticks("BTC");

        let reached = hub.publish_tick("BTC", sample_tick());
        assert_eq!(reached, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.data.best_bid().unwrap().price, 99.0);
        assert!(event.timestamp > 0.0);
    }

    #[tokio::test]
    async fn consumers_are_independent() {
        let hub = StreamHub::with_defaults();
        let mut fast = hub.subscribe_ticks("BTC");
        let mut slow = hub.subscribe_ticks("BTC");

        let _ = hub.publish_tick("BTC", sample_tick());
        let _ = hub.publish_tick("BTC", sample_tick());

        // Fast consumer drains both; slow consumer still sees both
        // afterwards at its own pace.
        let _ = fast.recv().await.unwrap();
        let _ = fast.recv().await.unwrap();
        let _ = slow.recv().await.unwrap();
        let _ = slow.recv().await.unwrap();
    }

    #[tokio::test]
    async fn symbols_are_isolated() {
        let hub = StreamHub::with_defaults();
        let mut btc = hub.subscribe_ticks("BTC");
        let _eth = hub.subscribe_ticks("ETH");

        let reached = hub.publish_tick("ETH", sample_tick());
        assert_eq!(reached, 1);

        // Nothing lands on the BTC channel.
        assert!(matches!(
            btc.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn receiver_counts_track_subscriptions() {
        let hub = StreamHub::with_defaults();
        assert_eq!(hub.tick_receiver_count("BTC"), 0);

        let rx1 = hub.subscribe_ticks("BTC");
        let rx2 = hub.subscribe_ticks("BTC");
        let rx3 = hub.subscribe_metrics("BTC");
        assert_eq!(hub.tick_receiver_count("BTC"), 2);
        assert_eq!(hub.metrics_receiver_count("BTC"), 1);
        assert_eq!(hub.total_receivers(), 3);

        drop((rx1, rx2, rx3));
        assert_eq!(hub.total_receivers(), 0);
    }

    #[test]
    fn tick_event_wire_shape() {
        let tick = sample_tick();
        let event = TickEvent {
            timestamp: tick.received_at_epoch(),
            data: tick,
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert!(json.get("data").is_some());
        assert!(json.get("timestamp").is_some());
        assert!(json["data"]["bids"].is_array());
    }
}
