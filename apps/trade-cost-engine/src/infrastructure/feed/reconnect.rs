//! Reconnection policy.
//!
//! The feed recovers from every connection failure the same way: wait
//! a fixed delay, then try again. There is no backoff growth, no
//! attempt cap, and no terminal give-up state; an ingestion loop is
//! designed to run for the lifetime of the process.

use std::time::Duration;

/// Fixed-delay, unlimited-attempt reconnection policy.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
    attempts: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ReconnectPolicy {
    /// Policy with the given fixed delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay, attempts: 0 }
    }

    /// Delay before the next attempt. Always available; reconnection
    /// never gives up.
    pub const fn next_delay(&mut self) -> Duration {
        self.attempts += 1;
        self.delay
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Clear the attempt counter after a successful connection.
    pub const fn reset(&mut self) {
        self.attempts = 0;
    }
}
