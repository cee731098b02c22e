//! Almgren-Chriss market impact.
//!
//! Splits the cost of an order's own price pressure into a temporary
//! component, a permanent component, and an execution-risk variance
//! penalty.

use serde::{Deserialize, Serialize};

/// Shape exponents and coefficients of the impact model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactParams {
    /// Temporary impact exponent.
    pub alpha: f64,
    /// Permanent impact exponent.
    pub beta: f64,
    /// Permanent impact coefficient.
    pub gamma: f64,
    /// Temporary impact coefficient.
    pub eta: f64,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            gamma: 0.05,
            eta: 0.05,
        }
    }
}

impl ImpactParams {
    /// Estimated market-impact cost in quote currency.
    ///
    /// `quantity` is the order size in base units, `time_horizon` the
    /// execution interval T, `volatility` sigma, and `risk_aversion`
    /// lambda:
    ///
    /// ```text
    /// temp = eta   * (q / T)^alpha
    /// perm = gamma * (q / T)^beta
    /// risk = 0.5 * lambda * sigma^2 * q^2 / T
    /// ```
    #[must_use]
    pub fn cost(
        &self,
        quantity: f64,
        time_horizon: f64,
        volatility: f64,
        risk_aversion: f64,
    ) -> f64 {
        let rate = quantity / time_horizon;
        let temp_impact = self.eta * rate.powf(self.alpha);
        let perm_impact = self.gamma * rate.powf(self.beta);
        let risk_term =
            0.5 * risk_aversion * volatility.powi(2) * quantity.powi(2) / time_horizon;
        temp_impact + perm_impact + risk_term
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_case() {
        // q=10, T=2, alpha=beta=1, gamma=eta=1, sigma=2, lambda=0.5:
        // temp=5, perm=5, risk=50, total=60
        let params = ImpactParams {
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            eta: 1.0,
        };
        let cost = params.cost(10.0, 2.0, 2.0, 0.5);
        assert!((cost - 60.0).abs() < 1e-12);
    }

    #[test]
    fn zero_risk_aversion_drops_risk_term() {
        let params = ImpactParams {
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            eta: 1.0,
        };
        let cost = params.cost(10.0, 2.0, 2.0, 0.0);
        assert!((cost - 10.0).abs() < 1e-12);
    }

    #[test]
    fn default_coefficients() {
        let params = ImpactParams::default();
        assert_eq!(params.gamma, 0.05);
        assert_eq!(params.eta, 0.05);
        // Linear exponents: cost scales with the trade rate.
        let cost = params.cost(10.0, 1.0, 0.0, 0.0);
        assert!((cost - 1.0).abs() < 1e-12);
    }
}
