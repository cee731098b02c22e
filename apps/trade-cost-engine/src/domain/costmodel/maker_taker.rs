//! Maker/taker split prediction.
//!
//! Logistic regression placeholder over the feature vector
//! `[spread, quantity, volatility]`. The default model (zero weights,
//! zero bias) predicts exactly 0.5 for every input.

use serde::{Deserialize, Serialize};

/// Number of input features.
pub const FEATURE_COUNT: usize = 3;

/// Logistic model with pluggable weights and bias.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MakerTakerModel {
    /// Per-feature weights for `[spread, quantity, volatility]`.
    pub weights: [f64; FEATURE_COUNT],
    /// Intercept term.
    pub bias: f64,
}

impl MakerTakerModel {
    /// Model with explicit weights and bias.
    #[must_use]
    pub const fn new(weights: [f64; FEATURE_COUNT], bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Predicted maker proportion in `[0, 1]`.
    #[must_use]
    pub fn maker_proportion(&self, features: [f64; FEATURE_COUNT]) -> f64 {
        let logits: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-logits).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_predicts_half() {
        let model = MakerTakerModel::default();
        for features in [[0.0; 3], [0.2, 5.0, 0.3], [1e6, -1e6, 42.0]] {
            assert_eq!(model.maker_proportion(features), 0.5);
        }
    }

    #[test]
    fn positive_logit_raises_proportion() {
        let model = MakerTakerModel::new([1.0, 0.0, 0.0], 0.0);
        let p = model.maker_proportion([2.0, 0.0, 0.0]);
        assert!(p > 0.5);
        assert!(p < 1.0);
    }

    #[test]
    fn bias_shifts_prediction() {
        let model = MakerTakerModel::new([0.0; 3], -3.0);
        let p = model.maker_proportion([1.0, 1.0, 1.0]);
        assert!(p < 0.5);
    }

    #[test]
    fn output_is_bounded() {
        let model = MakerTakerModel::new([100.0, 100.0, 100.0], 0.0);
        let hi = model.maker_proportion([1e6, 1e6, 1e6]);
        let lo = model.maker_proportion([-1e6, -1e6, -1e6]);
        assert!(hi <= 1.0);
        assert!(lo >= 0.0);
    }
}
