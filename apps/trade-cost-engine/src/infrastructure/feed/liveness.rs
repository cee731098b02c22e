//! Connection liveness probing.
//!
//! A keepalive exchange detects a dead connection faster than a full
//! read timeout would: a ping goes out at a fixed interval, and a
//! missing reply within the timeout marks the connection expired.
//!
//! The probe is plain state owned by the connection loop; the loop
//! drives it from its own ping interval and feeds it every inbound
//! message as proof of life.

use std::time::{Duration, Instant};

/// Liveness probe configuration.
#[derive(Debug, Clone)]
pub struct LivenessConfig {
    /// Interval between keepalive pings.
    pub ping_interval: Duration,
    /// Reply deadline before the connection counts as dead.
    pub pong_timeout: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(5),
            pong_timeout: Duration::from_secs(5),
        }
    }
}

/// Verdict of one probe poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessVerdict {
    /// Connection looks alive; a ping should go out.
    SendPing,
    /// Reply deadline passed; the connection must be torn down.
    Expired,
}

/// Per-connection liveness state.
#[derive(Debug)]
pub struct Liveness {
    config: LivenessConfig,
    last_reply: Instant,
    awaiting_reply: bool,
}

impl Liveness {
    /// Fresh probe for a newly opened connection.
    #[must_use]
    pub fn new(config: LivenessConfig) -> Self {
        Self {
            config,
            last_reply: Instant::now(),
            awaiting_reply: false,
        }
    }

    /// Record any inbound traffic as proof of life.
    pub fn record_reply(&mut self) {
        self.last_reply = Instant::now();
        self.awaiting_reply = false;
    }

    /// Poll on each ping interval: either the connection expired, or
    /// another ping is due.
    pub fn poll(&mut self) -> LivenessVerdict {
        self.poll_at(Instant::now())
    }

    fn poll_at(&mut self, now: Instant) -> LivenessVerdict {
        if self.awaiting_reply
            && now.saturating_duration_since(self.last_reply) > self.config.pong_timeout
        {
            return LivenessVerdict::Expired;
        }
        self.awaiting_reply = true;
        LivenessVerdict::SendPing
    }
}
