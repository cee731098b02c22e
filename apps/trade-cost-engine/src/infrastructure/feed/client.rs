//! Order-Book Feed Client
//!
//! One client per subscribed symbol. Maintains the WebSocket
//! connection to the venue's L2 snapshot stream, probes liveness,
//! decodes frames into ticks, and keeps the symbol's latest-tick slot
//! fresh.
//!
//! # Failure Semantics
//!
//! - A frame that fails to decode is dropped; the connection stays up.
//! - Any transport failure (handshake error, liveness expiry, close)
//!   tears the connection down, waits the fixed reconnect delay, and
//!   connects again. Indefinitely: there is no give-up state.
//! - The network read path never blocks on a slow consumer; the slot
//!   write is an O(1) overwrite.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::domain::orderbook::OrderBookTick;
use crate::infrastructure::metrics as prom;
use crate::infrastructure::publish::StreamHub;

use super::codec::TickCodec;
use super::liveness::{Liveness, LivenessConfig, LivenessVerdict};
use super::reconnect::ReconnectPolicy;
use super::slot::LatestSlot;

/// Errors that tear down one connection attempt.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Liveness probe expired without a reply.
    #[error("liveness probe expired")]
    LivenessExpired,

    /// Server closed the stream.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Connection state of one symbol's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedConnectionState {
    /// No connection task attached yet.
    #[default]
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Live and streaming.
    Connected,
    /// In the fixed delay between attempts.
    Reconnecting,
}

impl FeedConnectionState {
    /// Lower-case state name for status payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }
}

/// Shared observability state for one symbol's feed.
#[derive(Debug, Default)]
pub struct FeedStatus {
    state: RwLock<FeedConnectionState>,
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    reconnects: AtomicU64,
}

impl FeedStatus {
    /// Current connection state.
    pub fn state(&self) -> FeedConnectionState {
        *self.state.read()
    }

    /// Whether the feed is live.
    pub fn is_connected(&self) -> bool {
        self.state() == FeedConnectionState::Connected
    }

    /// Decoded frames since startup.
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    /// Undecodable frames dropped since startup.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Reconnect attempts since startup.
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: FeedConnectionState) {
        *self.state.write() = state;
    }

    fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }
}

/// Configuration for one feed connection.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Fully resolved WebSocket URL for the symbol.
    pub url: String,
    /// Liveness probe settings.
    pub liveness: LivenessConfig,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay: Duration,
}

/// Per-symbol feed connection loop.
pub struct FeedClient {
    symbol: String,
    config: FeedClientConfig,
    codec: TickCodec,
    slot: Arc<LatestSlot<OrderBookTick>>,
    hub: Arc<StreamHub>,
    status: Arc<FeedStatus>,
    cancel: CancellationToken,
}

impl FeedClient {
    /// Create a client for one symbol.
    #[must_use]
    pub fn new(
        symbol: String,
        config: FeedClientConfig,
        slot: Arc<LatestSlot<OrderBookTick>>,
        hub: Arc<StreamHub>,
        status: Arc<FeedStatus>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            symbol,
            config,
            codec: TickCodec::new(),
            slot,
            hub,
            status,
            cancel,
        }
    }

    /// Run the connect/stream/reconnect loop until cancelled.
    pub async fn run(self) {
        let mut policy = ReconnectPolicy::new(self.config.reconnect_delay);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.status.set_state(FeedConnectionState::Connecting);

            match self.connect_and_stream(&mut policy).await {
                Ok(()) => break, // cancelled mid-stream
                Err(e) => {
                    self.status.set_state(FeedConnectionState::Reconnecting);
                    self.status.record_reconnect();
                    prom::record_reconnect(&self.symbol);

                    let delay = policy.next_delay();
                    tracing::warn!(
                        symbol = %self.symbol,
                        error = %e,
                        attempt = policy.attempts(),
                        delay_ms = delay.as_millis(),
                        "order-book feed disconnected, retrying"
                    );

                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.status.set_state(FeedConnectionState::Idle);
        tracing::info!(symbol = %self.symbol, "order-book feed stopped");
    }

    /// One connection attempt: stream frames until cancellation
    /// (`Ok`) or a transport failure (`Err`).
    async fn connect_and_stream(&self, policy: &mut ReconnectPolicy) -> Result<(), FeedError> {
        tracing::info!(symbol = %self.symbol, url = %self.config.url, "connecting to order-book feed");

        let (ws_stream, _response) =
            tokio_tungstenite::connect_async(self.config.url.as_str()).await?;

        self.status.set_state(FeedConnectionState::Connected);
        policy.reset();
        prom::set_feed_connected(&self.symbol, true);
        tracing::info!(symbol = %self.symbol, "order-book feed connected");

        let (mut write, mut read) = ws_stream.split();

        let mut liveness = Liveness::new(self.config.liveness.clone());
        let mut ping_timer = tokio::time::interval(self.config.liveness.ping_interval);
        ping_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Consume the immediate first tick; the probe starts counting
        // from an established connection.
        ping_timer.tick().await;

        let result = loop {
            tokio::select! {
                () = self.cancel.cancelled() => break Ok(()),
                _ = ping_timer.tick() => {
                    match liveness.poll() {
                        LivenessVerdict::SendPing => {
                            if let Err(e) = write.send(Message::Ping(Vec::new().into())).await {
                                break Err(e.into());
                            }
                        }
                        LivenessVerdict::Expired => break Err(FeedError::LivenessExpired),
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            liveness.record_reply();
                            self.handle_frame(text.as_str());
                        }
                        Some(Ok(Message::Pong(_))) => liveness.record_reply(),
                        Some(Ok(Message::Ping(data))) => {
                            liveness.record_reply();
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                break Err(e.into());
                            }
                        }
                        Some(Ok(Message::Close(_))) => break Err(FeedError::ConnectionClosed),
                        Some(Ok(_)) => {} // binary and raw frames are not part of this feed
                        Some(Err(e)) => break Err(e.into()),
                        None => break Err(FeedError::ConnectionClosed),
                    }
                }
            }
        };

        prom::set_feed_connected(&self.symbol, false);
        result
    }

    /// Decode one frame and publish it. Decode failure drops the
    /// frame only, never the connection.
    fn handle_frame(&self, text: &str) {
        match self.codec.decode(text, Utc::now()) {
            Ok(tick) => {
                self.status.record_frame();
                prom::record_frame_received(&self.symbol);

                let overwrote = self.slot.publish(tick.clone());
                if overwrote {
                    prom::record_tick_overwritten(&self.symbol);
                }
                self.hub.publish_tick(&self.symbol, tick);
            }
            Err(e) => {
                self.status.record_dropped();
                prom::record_frame_dropped(&self.symbol);
                tracing::debug!(symbol = %self.symbol, error = %e, "dropping undecodable frame");
            }
        }
    }
}
