//! Slippage estimation.
//!
//! Linear placeholder model: `coefficient * spread * quantity`.

use serde::{Deserialize, Serialize};

/// Linear slippage model with a pluggable coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlippageModel {
    /// Multiplier applied to `spread * quantity`.
    pub coefficient: f64,
}

impl Default for SlippageModel {
    fn default() -> Self {
        Self { coefficient: 1.0 }
    }
}

impl SlippageModel {
    /// Model with an explicit coefficient.
    #[must_use]
    pub const fn with_coefficient(coefficient: f64) -> Self {
        Self { coefficient }
    }

    /// Expected slippage cost in quote currency for an order of
    /// `quantity` (base units) against the given spread.
    #[must_use]
    pub fn estimate(&self, spread: f64, quantity: f64) -> f64 {
        self.coefficient * spread * quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_case() {
        let model = SlippageModel::with_coefficient(2.5);
        assert!((model.estimate(0.2, 5.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn default_coefficient_is_identity() {
        let model = SlippageModel::default();
        assert_eq!(model.estimate(0.5, 4.0), 2.0);
    }

    #[test]
    fn zero_spread_means_zero_slippage() {
        assert_eq!(SlippageModel::default().estimate(0.0, 100.0), 0.0);
    }
}
