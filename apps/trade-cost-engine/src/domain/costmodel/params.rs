//! Cost-model input parameters.

use serde::{Deserialize, Serialize};

use super::{CostModelError, FeeTier};

/// Caller-supplied parameters for one cost computation.
///
/// Immutable for the duration of a single computation. Exactly these
/// fields affect the result; there are no hidden inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModelParams {
    /// Order size in USD equivalent. Must be positive.
    pub quantity_usd: f64,
    /// Asset volatility (sigma). Must be non-negative.
    pub volatility: f64,
    /// Exchange fee tier used for the fee lookup.
    pub fee_tier: FeeTier,
    /// Trader's risk aversion (lambda). Must be non-negative.
    pub risk_aversion: f64,
    /// Total execution interval (T). Must be positive.
    pub time_horizon: f64,
    /// Number of trajectory steps (N). Must be positive.
    pub time_steps: usize,
}

impl Default for CostModelParams {
    fn default() -> Self {
        Self {
            quantity_usd: 100.0,
            volatility: 0.3,
            fee_tier: FeeTier::Tier0,
            risk_aversion: 0.001,
            time_horizon: 1.0,
            time_steps: 100,
        }
    }
}

impl CostModelParams {
    /// Validate all fields eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`CostModelError::InvalidParameter`] naming the first
    /// field that violates its range constraint.
    pub fn validate(&self) -> Result<(), CostModelError> {
        if !self.quantity_usd.is_finite() || self.quantity_usd <= 0.0 {
            return Err(invalid("quantity_usd", "must be positive", self.quantity_usd));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(invalid("volatility", "must be non-negative", self.volatility));
        }
        if !self.risk_aversion.is_finite() || self.risk_aversion < 0.0 {
            return Err(invalid(
                "risk_aversion",
                "must be non-negative",
                self.risk_aversion,
            ));
        }
        if !self.time_horizon.is_finite() || self.time_horizon <= 0.0 {
            return Err(invalid("time_horizon", "must be positive", self.time_horizon));
        }
        if self.time_steps == 0 {
            return Err(CostModelError::InvalidParameter {
                name: "time_steps",
                reason: "must be positive, got 0".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid(name: &'static str, constraint: &str, got: f64) -> CostModelError {
    CostModelError::InvalidParameter {
        name,
        reason: format!("{constraint}, got {got}"),
    }
}
