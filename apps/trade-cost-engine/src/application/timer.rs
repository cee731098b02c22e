//! Internal latency measurement.

use std::time::Instant;

/// Measures wall-clock elapsed time between pipeline invocations.
///
/// Holds the timestamp of the previous tick; the first call to
/// [`LatencyTimer::tick`] measures time since construction. Backed by
/// a monotonic clock, so the output is always non-negative. Owned by a
/// single consumer loop; not synchronized.
#[derive(Debug)]
pub struct LatencyTimer {
    last: Instant,
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyTimer {
    /// Start the timer at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the previous call (or construction),
    /// resetting the mark.
    #[must_use]
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64() * 1000.0;
        self.last = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn first_tick_measures_since_construction() {
        let mut timer = LatencyTimer::new();
        let ms = timer.tick();
        assert!(ms >= 0.0);
        assert!(ms < 1000.0);
    }

    #[test]
    fn simulated_ten_second_gap() {
        let mut timer = LatencyTimer::new();
        let start = Instant::now();
        let _ = timer.tick_at(start);
        let ms = timer.tick_at(start + Duration::from_secs(10));
        assert!((ms - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn mark_resets_on_every_tick() {
        let mut timer = LatencyTimer::new();
        let start = Instant::now();
        let _ = timer.tick_at(start);
        let _ = timer.tick_at(start + Duration::from_secs(10));
        let ms = timer.tick_at(start + Duration::from_secs(11));
        assert!((ms - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn clock_never_goes_negative() {
        let mut timer = LatencyTimer::new();
        let start = Instant::now();
        let _ = timer.tick_at(start + Duration::from_secs(5));
        // A now() before the stored mark saturates to zero.
        assert_eq!(timer.tick_at(start), 0.0);
    }
}
