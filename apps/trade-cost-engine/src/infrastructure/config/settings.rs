//! Engine configuration settings.
//!
//! Every knob is an explicit, typed, defaulted field, parsed and
//! validated eagerly at startup. Malformed values are errors, not
//! silent fallbacks.
//!
//! # Environment Variables
//!
//! All optional, namespaced `COST_ENGINE_*`:
//!
//! - `COST_ENGINE_SYMBOLS`: comma-separated symbols (default `BTC-USDT-SWAP`)
//! - `COST_ENGINE_FEED_URL_TEMPLATE`: WebSocket URL with `{symbol}` placeholder
//! - `COST_ENGINE_PING_INTERVAL_SECS` / `COST_ENGINE_PONG_TIMEOUT_SECS`
//! - `COST_ENGINE_RECONNECT_DELAY_MS`
//! - `COST_ENGINE_HTTP_PORT`
//! - `COST_ENGINE_COMPUTE_INTERVAL_MS`
//! - `COST_ENGINE_TICKS_CAPACITY` / `COST_ENGINE_METRICS_CAPACITY`
//! - `COST_ENGINE_QUANTITY_USD`, `COST_ENGINE_VOLATILITY`,
//!   `COST_ENGINE_FEE_TIER`, `COST_ENGINE_RISK_AVERSION`,
//!   `COST_ENGINE_TIME_HORIZON`, `COST_ENGINE_TIME_STEPS`

use std::str::FromStr;
use std::time::Duration;

use crate::domain::costmodel::{CostModelError, CostModelParams, FeeTier};
use crate::infrastructure::feed::LivenessConfig;

/// Default per-symbol feed endpoint template.
const DEFAULT_URL_TEMPLATE: &str = "wss://ws.gomarket-cpp.goquant.io/ws/l2-orderbook/okx/{symbol}";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds an unparseable value.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// The assembled model parameters fail validation.
    #[error("invalid model parameters: {0}")]
    InvalidParams(#[from] CostModelError),
}

/// Feed connection settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// WebSocket endpoint template with a `{symbol}` placeholder.
    pub url_template: String,
    /// Liveness probe settings.
    pub liveness: LivenessConfig,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            liveness: LivenessConfig::default(),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl FeedSettings {
    /// Resolve the endpoint URL for a symbol.
    #[must_use]
    pub fn url_for(&self, symbol: &str) -> String {
        self.url_template.replace("{symbol}", symbol)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Port for the stream/health endpoints.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Compute loop settings.
#[derive(Debug, Clone)]
pub struct ComputeSettings {
    /// Slot drain interval per symbol.
    pub interval: Duration,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
        }
    }
}

/// Fan-out channel capacities.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSettings {
    /// Capacity of each per-symbol tick channel.
    pub ticks_capacity: usize,
    /// Capacity of each per-symbol metrics channel.
    pub metrics_capacity: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            ticks_capacity: 256,
            metrics_capacity: 256,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Symbols to activate at startup.
    pub symbols: Vec<String>,
    /// Feed connection settings.
    pub feed: FeedSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Compute loop settings.
    pub compute: ComputeSettings,
    /// Fan-out channel capacities.
    pub channels: ChannelSettings,
    /// Cost-model parameters applied to every symbol.
    pub params: CostModelParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC-USDT-SWAP".to_string()],
            feed: FeedSettings::default(),
            server: ServerSettings::default(),
            compute: ComputeSettings::default(),
            channels: ChannelSettings::default(),
            params: CostModelParams::default(),
        }
    }
}

impl EngineConfig {
    /// Assemble configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any unparseable value or for model
    /// parameters outside their valid range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let symbols = parse_symbols(env("COST_ENGINE_SYMBOLS"))?;

        let feed = FeedSettings {
            url_template: env("COST_ENGINE_FEED_URL_TEMPLATE")
                .unwrap_or(defaults.feed.url_template),
            liveness: LivenessConfig {
                ping_interval: Duration::from_secs(parse(
                    "COST_ENGINE_PING_INTERVAL_SECS",
                    defaults.feed.liveness.ping_interval.as_secs(),
                )?),
                pong_timeout: Duration::from_secs(parse(
                    "COST_ENGINE_PONG_TIMEOUT_SECS",
                    defaults.feed.liveness.pong_timeout.as_secs(),
                )?),
            },
            reconnect_delay: Duration::from_millis(parse(
                "COST_ENGINE_RECONNECT_DELAY_MS",
                u64::try_from(defaults.feed.reconnect_delay.as_millis()).unwrap_or(1000),
            )?),
        };

        let server = ServerSettings {
            port: parse("COST_ENGINE_HTTP_PORT", defaults.server.port)?,
        };

        let compute = ComputeSettings {
            interval: Duration::from_millis(parse(
                "COST_ENGINE_COMPUTE_INTERVAL_MS",
                u64::try_from(defaults.compute.interval.as_millis()).unwrap_or(1000),
            )?),
        };

        let channels = ChannelSettings {
            ticks_capacity: parse("COST_ENGINE_TICKS_CAPACITY", defaults.channels.ticks_capacity)?,
            metrics_capacity: parse(
                "COST_ENGINE_METRICS_CAPACITY",
                defaults.channels.metrics_capacity,
            )?,
        };

        let params = CostModelParams {
            quantity_usd: parse("COST_ENGINE_QUANTITY_USD", defaults.params.quantity_usd)?,
            volatility: parse("COST_ENGINE_VOLATILITY", defaults.params.volatility)?,
            fee_tier: parse_fee_tier(env("COST_ENGINE_FEE_TIER"), defaults.params.fee_tier)?,
            risk_aversion: parse("COST_ENGINE_RISK_AVERSION", defaults.params.risk_aversion)?,
            time_horizon: parse("COST_ENGINE_TIME_HORIZON", defaults.params.time_horizon)?,
            time_steps: parse("COST_ENGINE_TIME_STEPS", defaults.params.time_steps)?,
        };
        params.validate()?;

        Ok(Self {
            symbols,
            feed,
            server,
            compute,
            channels,
            params,
        })
    }
}

fn env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

fn parse<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    parse_raw(var, env(var), default)
}

fn parse_raw<T: FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var,
            reason: format!("cannot parse {value:?}"),
        }),
    }
}

fn parse_fee_tier(raw: Option<String>, default: FeeTier) -> Result<FeeTier, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: CostModelError| ConfigError::InvalidValue {
            var: "COST_ENGINE_FEE_TIER",
            reason: e.to_string(),
        }),
    }
}

fn parse_symbols(raw: Option<String>) -> Result<Vec<String>, ConfigError> {
    let Some(value) = raw else {
        return Ok(vec!["BTC-USDT-SWAP".to_string()]);
    };
    let symbols: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect();
    if symbols.is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "COST_ENGINE_SYMBOLS",
            reason: "no symbols listed".to_string(),
        });
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = EngineConfig::default();
        assert_eq!(config.symbols, vec!["BTC-USDT-SWAP"]);
        assert_eq!(config.feed.liveness.ping_interval, Duration::from_secs(5));
        assert_eq!(config.feed.liveness.pong_timeout, Duration::from_secs(5));
        assert_eq!(config.feed.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.compute.interval, Duration::from_millis(1000));
        assert_eq!(config.server.port, 8080);
        assert!(config.params.validate().is_ok());
    }

    #[test]
    fn url_template_substitutes_symbol() {
        let feed = FeedSettings::default();
        assert_eq!(
            feed.url_for("BTC-USDT-SWAP"),
            "wss://ws.gomarket-cpp.goquant.io/ws/l2-orderbook/okx/BTC-USDT-SWAP"
        );
    }

    #[test]
    fn absent_value_uses_default() {
        assert_eq!(parse_raw("X", None, 42u64).unwrap(), 42);
    }

    #[test]
    fn malformed_value_is_an_error_not_a_default() {
        let err = parse_raw("X", Some("not-a-number".to_string()), 42u64).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "X", .. }));
    }

    #[test]
    fn values_are_trimmed_before_parsing() {
        assert_eq!(parse_raw("X", Some(" 7 ".to_string()), 0u16).unwrap(), 7);
    }

    #[test]
    fn symbols_parse_from_csv() {
        let symbols = parse_symbols(Some("BTC-USDT-SWAP, ETH-USDT-SWAP".to_string())).unwrap();
        assert_eq!(symbols, vec!["BTC-USDT-SWAP", "ETH-USDT-SWAP"]);
    }

    #[test]
    fn empty_symbol_list_is_an_error() {
        assert!(parse_symbols(Some(" , ,".to_string())).is_err());
    }

    #[test]
    fn fee_tier_parses_and_rejects() {
        assert_eq!(
            parse_fee_tier(Some("Tier 1".to_string()), FeeTier::Tier0).unwrap(),
            FeeTier::Tier1
        );
        assert!(parse_fee_tier(Some("Tier 9".to_string()), FeeTier::Tier0).is_err());
        assert_eq!(parse_fee_tier(None, FeeTier::Tier2).unwrap(), FeeTier::Tier2);
    }
}
