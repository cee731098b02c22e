//! Cost Model
//!
//! Closed-form trading-cost estimators: slippage, exchange fees,
//! Almgren-Chriss market impact, maker/taker split, and the optimal
//! execution trajectory. All of them are deliberately simple
//! placeholder models with pluggable coefficients; none of them is
//! statistically calibrated.
//!
//! Every function here is pure. Failures are synchronous and typed:
//! an unusable tick or an out-of-range parameter is an error, never a
//! silent default. The single exception is the degenerate-regime
//! fallback of the execution trajectory, which is defined numeric
//! policy rather than an error.

mod fees;
mod impact;
mod maker_taker;
mod params;
mod slippage;
mod trajectory;

pub use fees::{FeeRates, FeeSchedule, FeeTier, LiquidityRole};
pub use impact::ImpactParams;
pub use maker_taker::MakerTakerModel;
pub use params::CostModelParams;
pub use slippage::SlippageModel;
pub use trajectory::{TrajectoryPoint, optimal_trajectory};

use serde::Serialize;

/// Errors surfaced by the cost-model pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostModelError {
    /// The tick is missing one side of the book.
    #[error("invalid tick: {0} side is empty")]
    InvalidTick(&'static str),

    /// The requested fee tier is not present in the fee schedule.
    #[error("unknown fee tier: {0}")]
    UnknownFeeTier(String),

    /// A model parameter is out of its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Name of the offending field.
        name: &'static str,
        /// Human-readable constraint violation.
        reason: String,
    },
}

/// One computed metrics set for one tick.
///
/// A result is a value: produced fresh on every tick, never mutated
/// afterwards, serialized as-is onto the stream boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    /// Expected slippage cost in quote currency.
    pub slippage: f64,
    /// Expected exchange fee in quote currency (taker fill assumed).
    pub fees: f64,
    /// Expected market-impact cost in quote currency.
    pub impact: f64,
    /// `slippage + fees + impact`.
    pub net_cost: f64,
    /// Predicted share of the order executed as maker, in `[0, 1]`.
    pub maker_proportion: f64,
    /// Internal processing latency in milliseconds. Informational
    /// only; not part of the cost math.
    pub latency_ms: f64,
    /// Optimal remaining-quantity schedule, `time_steps + 1` points.
    pub trajectory: Vec<TrajectoryPoint>,
}
