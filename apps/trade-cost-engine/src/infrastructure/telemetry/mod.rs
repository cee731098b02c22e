//! Tracing Initialization
//!
//! Structured logging via `tracing` with an `EnvFilter`-driven level.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (default: `info`)
//!
//! # Usage
//!
//! ```ignore
//! // Initialize at startup (keep the guard alive)
//! let _guard = telemetry::init();
//! tracing::info!("starting");
//! ```

use tracing_subscriber::EnvFilter;

/// Guard returned by [`init`]; keep it alive for the program's
/// lifetime so future exporter backends can flush on drop.
pub struct TelemetryGuard {
    _private: (),
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs a
/// subscriber (later calls, e.g. from tests, are no-ops).
#[must_use]
pub fn init() -> TelemetryGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    TelemetryGuard { _private: () }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_reentrant() {
        let _first = init();
        let _second = init();
    }
}
