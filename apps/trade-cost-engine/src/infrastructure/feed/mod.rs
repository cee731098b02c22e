//! Streaming ingestion.
//!
//! One supervised WebSocket connection per subscribed symbol, decoded
//! into [`crate::domain::orderbook::OrderBookTick`]s and delivered
//! through a per-symbol latest-tick slot. Transport failures recover
//! locally with an unconditional fixed-delay retry; nothing in this
//! module surfaces an error to downstream consumers.

pub mod client;
pub mod codec;
pub mod liveness;
pub mod manager;
pub mod reconnect;
pub mod slot;

pub use client::{FeedClient, FeedClientConfig, FeedConnectionState, FeedError, FeedStatus};
pub use codec::{CodecError, TickCodec};
pub use liveness::{Liveness, LivenessConfig, LivenessVerdict};
pub use manager::IngestManager;
pub use reconnect::ReconnectPolicy;
pub use slot::LatestSlot;
