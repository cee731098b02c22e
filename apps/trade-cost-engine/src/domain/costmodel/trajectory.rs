//! Almgren-Chriss optimal execution trajectory.
//!
//! Closed-form remaining-quantity schedule minimizing the cost/risk
//! tradeoff. With `kappa = sqrt(lambda * sigma^2 / eta)` the optimal
//! path is
//!
//! ```text
//! x(t) = X * sinh(kappa * (T - t)) / sinh(kappa * T)
//! ```
//!
//! sampled at `N + 1` evenly spaced points over `[0, T]`. Whenever
//! `kappa` is undefined or zero (eta = 0, or lambda * sigma^2 = 0) the
//! schedule degenerates to linear decay `x(t) = X * (1 - t / T)`. The
//! fallback is taken before any division or square root can fail; the
//! primary formula never raises a numeric error.

use serde::{Deserialize, Serialize};

/// One sample of the execution schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Time offset from execution start.
    pub t: f64,
    /// Quantity still unexecuted at `t`, in base units.
    pub remaining_qty: f64,
}

/// Compute the optimal execution schedule.
///
/// `total_qty` is X (base units), `time_horizon` is T, and the result
/// has `time_steps + 1` points with `x(0) = X` and `x(T) = 0`.
/// Callers validate their inputs first; this function assumes
/// `total_qty >= 0`, `time_horizon > 0`, `time_steps > 0` and applies
/// the linear fallback for every degenerate coefficient combination.
#[must_use]
pub fn optimal_trajectory(
    total_qty: f64,
    time_horizon: f64,
    time_steps: usize,
    volatility: f64,
    risk_aversion: f64,
    eta: f64,
) -> Vec<TrajectoryPoint> {
    let kappa = urgency(volatility, risk_aversion, eta);
    match kappa {
        Some(kappa) => sinh_schedule(total_qty, time_horizon, time_steps, kappa),
        None => linear_schedule(total_qty, time_horizon, time_steps),
    }
}

/// `kappa = sqrt(lambda * sigma^2 / eta)`, or `None` in any regime
/// where the expression is undefined, zero, or non-finite.
fn urgency(volatility: f64, risk_aversion: f64, eta: f64) -> Option<f64> {
    if eta <= 0.0 {
        return None;
    }
    let kappa_sq = risk_aversion * volatility.powi(2) / eta;
    if !kappa_sq.is_finite() || kappa_sq <= 0.0 {
        return None;
    }
    let kappa = kappa_sq.sqrt();
    kappa.is_finite().then_some(kappa)
}

fn sinh_schedule(
    total_qty: f64,
    time_horizon: f64,
    time_steps: usize,
    kappa: f64,
) -> Vec<TrajectoryPoint> {
    // sinh(k(T-t))/sinh(kT) rewritten with non-positive exponents only:
    // exp(-kt) * (1 - exp(-2k(T-t))) / (1 - exp(-2kT)). The naive sinh
    // ratio overflows to inf/inf for large kT.
    let denom = 1.0 - (-2.0 * kappa * time_horizon).exp();
    if denom <= 0.0 || !denom.is_finite() {
        // kT below float resolution; indistinguishable from kappa = 0.
        return linear_schedule(total_qty, time_horizon, time_steps);
    }

    sample_times(time_horizon, time_steps)
        .map(|t| {
            let ratio = (-kappa * t).exp() * (1.0 - (-2.0 * kappa * (time_horizon - t)).exp())
                / denom;
            TrajectoryPoint {
                t,
                remaining_qty: total_qty * ratio,
            }
        })
        .collect()
}

fn linear_schedule(total_qty: f64, time_horizon: f64, time_steps: usize) -> Vec<TrajectoryPoint> {
    sample_times(time_horizon, time_steps)
        .map(|t| TrajectoryPoint {
            t,
            remaining_qty: total_qty * (1.0 - t / time_horizon),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn sample_times(time_horizon: f64, time_steps: usize) -> impl Iterator<Item = f64> {
    let steps = time_steps as f64;
    (0..=time_steps).map(move |i| time_horizon * (i as f64) / steps)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn sinh_branch_boundaries() {
        let path = optimal_trajectory(1_000_000.0, 1.0, 100, 0.2, 1e-6, 1e-6);
        assert_eq!(path.len(), 101);
        assert!((path[0].remaining_qty - 1_000_000.0).abs() < 1e-6);
        assert_eq!(path[100].remaining_qty, 0.0);
        assert_eq!(path[0].t, 0.0);
        assert_eq!(path[100].t, 1.0);
    }

    #[test]
    fn sinh_branch_is_monotone_decreasing() {
        let path = optimal_trajectory(100.0, 2.0, 50, 0.3, 0.01, 0.05);
        for pair in path.windows(2) {
            assert!(
                pair[1].remaining_qty <= pair[0].remaining_qty + 1e-9,
                "schedule increased between {} and {}",
                pair[0].t,
                pair[1].t
            );
        }
    }

    #[test]
    fn higher_urgency_front_loads_execution() {
        let relaxed = optimal_trajectory(100.0, 1.0, 10, 0.2, 1e-4, 0.05);
        let urgent = optimal_trajectory(100.0, 1.0, 10, 0.2, 10.0, 0.05);
        // At the midpoint the urgent schedule has executed more.
        assert!(urgent[5].remaining_qty < relaxed[5].remaining_qty);
    }

    #[test]
    fn zero_eta_falls_back_to_linear() {
        let path = optimal_trajectory(10.0, 2.0, 4, 0.3, 0.5, 0.0);
        let expected = [10.0, 7.5, 5.0, 2.5, 0.0];
        for (point, want) in path.iter().zip(expected) {
            assert!((point.remaining_qty - want).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_volatility_falls_back_to_linear() {
        let path = optimal_trajectory(10.0, 1.0, 2, 0.0, 0.5, 0.05);
        assert_eq!(path[0].remaining_qty, 10.0);
        assert_eq!(path[1].remaining_qty, 5.0);
        assert_eq!(path[2].remaining_qty, 0.0);
    }

    #[test]
    fn zero_risk_aversion_falls_back_to_linear() {
        let path = optimal_trajectory(10.0, 1.0, 2, 0.3, 0.0, 0.05);
        assert_eq!(path[1].remaining_qty, 5.0);
    }

    #[test]
    fn huge_urgency_does_not_overflow() {
        // kT ~ 2e4: naive sinh would be inf.
        let path = optimal_trajectory(100.0, 1.0, 10, 100.0, 4.0, 1e-4);
        assert!(path.iter().all(|p| p.remaining_qty.is_finite()));
        assert!((path[0].remaining_qty - 100.0).abs() < 1e-9);
        assert_eq!(path[10].remaining_qty, 0.0);
    }

    proptest! {
        #[test]
        fn boundaries_hold_for_all_regimes(
            total_qty in 0.001f64..1e9,
            time_horizon in 0.01f64..100.0,
            time_steps in 1usize..200,
            volatility in 0.0f64..10.0,
            risk_aversion in 0.0f64..10.0,
            eta in 0.0f64..1.0,
        ) {
            let path = optimal_trajectory(
                total_qty,
                time_horizon,
                time_steps,
                volatility,
                risk_aversion,
                eta,
            );
            prop_assert_eq!(path.len(), time_steps + 1);
            let x0 = path[0].remaining_qty;
            let xn = path[time_steps].remaining_qty;
            prop_assert!((x0 - total_qty).abs() <= total_qty * 1e-9);
            prop_assert!(xn.abs() <= total_qty * 1e-9);
        }
    }
}
