//! Cost Model Pipeline
//!
//! The `compute` entry point: one tick plus one parameter set in, one
//! [`MetricsResult`] out. Pure apart from the owned latency timer.
//!
//! Failure policy: an unusable tick or an out-of-range parameter is a
//! typed error and the caller skips the tick; no partial results are
//! produced. The trajectory's degenerate-regime fallback is handled
//! inside the trajectory model and is not an error.

use crate::application::timer::LatencyTimer;
use crate::domain::costmodel::{
    CostModelError, CostModelParams, FeeSchedule, ImpactParams, LiquidityRole, MakerTakerModel,
    MetricsResult, SlippageModel, optimal_trajectory,
};
use crate::domain::orderbook::OrderBookTick;

/// The pluggable model set used by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CostModels {
    /// Tier-to-rates fee table.
    pub fee_schedule: FeeSchedule,
    /// Linear slippage model.
    pub slippage: SlippageModel,
    /// Almgren-Chriss impact coefficients.
    pub impact: ImpactParams,
    /// Maker/taker logistic model.
    pub maker_taker: MakerTakerModel,
}

/// Per-consumer computation pipeline.
///
/// Owns its [`LatencyTimer`]; construct one pipeline per consumer
/// loop rather than sharing across tasks.
#[derive(Debug, Default)]
pub struct CostPipeline {
    models: CostModels,
    timer: LatencyTimer,
}

impl CostPipeline {
    /// Pipeline with an explicit model set.
    #[must_use]
    pub fn new(models: CostModels) -> Self {
        Self {
            models,
            timer: LatencyTimer::new(),
        }
    }

    /// Compute the full metrics set for one tick.
    ///
    /// The fee always assumes a taker fill; the predicted maker
    /// proportion is reported alongside but does not blend the fee.
    ///
    /// # Errors
    ///
    /// - [`CostModelError::InvalidParameter`] for out-of-range params.
    /// - [`CostModelError::InvalidTick`] when either book side is empty.
    /// - [`CostModelError::UnknownFeeTier`] when the configured tier is
    ///   absent from the fee schedule.
    pub fn compute(
        &mut self,
        tick: &OrderBookTick,
        params: &CostModelParams,
    ) -> Result<MetricsResult, CostModelError> {
        params.validate()?;

        if tick.bids.is_empty() {
            return Err(CostModelError::InvalidTick("bid"));
        }
        if tick.asks.is_empty() {
            return Err(CostModelError::InvalidTick("ask"));
        }

        // Both sides checked above.
        let mid_price = tick.mid_price().ok_or(CostModelError::InvalidTick("bid"))?;
        let spread = tick.spread().ok_or(CostModelError::InvalidTick("ask"))?;
        let base_qty = params.quantity_usd / mid_price;

        let slippage = self.models.slippage.estimate(spread, base_qty);
        let fees = self.models.fee_schedule.fee(
            mid_price,
            base_qty,
            params.fee_tier,
            LiquidityRole::Taker,
        )?;
        let impact = self.models.impact.cost(
            base_qty,
            params.time_horizon,
            params.volatility,
            params.risk_aversion,
        );
        let net_cost = slippage + fees + impact;

        let maker_proportion = self
            .models
            .maker_taker
            .maker_proportion([spread, base_qty, params.volatility]);

        let trajectory = optimal_trajectory(
            base_qty,
            params.time_horizon,
            params.time_steps,
            params.volatility,
            params.risk_aversion,
            self.models.impact.eta,
        );

        let latency_ms = self.timer.tick();

        Ok(MetricsResult {
            slippage,
            fees,
            impact,
            net_cost,
            maker_proportion,
            latency_ms,
            trajectory,
        })
    }
}
