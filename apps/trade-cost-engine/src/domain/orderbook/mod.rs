//! Order Book Types
//!
//! Canonical internal representation of an L2 order-book snapshot.
//! These types are codec-agnostic: the wire format (string-encoded
//! price/size pairs) is handled by the feed codec, which produces the
//! types defined here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Limit price in quote currency.
    pub price: f64,
    /// Resting size in base currency.
    pub size: f64,
}

impl BookLevel {
    /// Create a new level.
    #[must_use]
    pub const fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

/// One snapshot of the order book at a point in time.
///
/// Bids are sorted descending by price, asks ascending, so the best
/// level of each side is at index 0. A tick is only usable when both
/// sides are non-empty; consumers must treat an empty side as an
/// invalid tick rather than defaulting prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookTick {
    /// Bid levels, best (highest) first.
    pub bids: Vec<BookLevel>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<BookLevel>,
    /// Wall-clock time the frame was received.
    pub received_at: DateTime<Utc>,
}

impl OrderBookTick {
    /// Create a tick stamped with the given receive time.
    #[must_use]
    pub const fn new(
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bids,
            asks,
            received_at,
        }
    }

    /// Best (highest) bid level, if the bid side is non-empty.
    #[must_use]
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }

    /// Best (lowest) ask level, if the ask side is non-empty.
    #[must_use]
    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    /// Whether both sides carry at least one level.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Mid price `(best_bid + best_ask) / 2`.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some(0.5 * (bid + ask))
    }

    /// Bid-ask spread `best_ask - best_bid`.
    ///
    /// Non-negative for a well-formed book; a crossed book yields a
    /// negative spread, which is preserved rather than clamped.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some(ask - bid)
    }

    /// Epoch seconds of the receive stamp, fractional part preserved.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn received_at_epoch(&self) -> f64 {
        self.received_at.timestamp_micros() as f64 / 1_000_000.0
    }
}
