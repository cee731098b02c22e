//! Exchange fee schedule.
//!
//! Maps fee tiers to maker/taker rates. The schedule is read-only
//! after construction; a lookup of a tier that is absent from the
//! schedule is a typed error, never a silent default.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CostModelError;

/// Exchange fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeeTier {
    /// Base tier.
    Tier0,
    /// First volume discount.
    Tier1,
    /// Second volume discount.
    Tier2,
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tier0 => write!(f, "Tier 0"),
            Self::Tier1 => write!(f, "Tier 1"),
            Self::Tier2 => write!(f, "Tier 2"),
        }
    }
}

impl FromStr for FeeTier {
    type Err = CostModelError;

    /// Parse a tier name. Accepts `"Tier 0"`, `"tier0"`, `"0"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(' ', "");
        match normalized.as_str() {
            "tier0" | "0" => Ok(Self::Tier0),
            "tier1" | "1" => Ok(Self::Tier1),
            "tier2" | "2" => Ok(Self::Tier2),
            _ => Err(CostModelError::UnknownFeeTier(s.to_string())),
        }
    }
}

/// Maker/taker rate pair for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRates {
    /// Rate applied to maker (liquidity-adding) fills.
    pub maker: f64,
    /// Rate applied to taker (liquidity-removing) fills.
    pub taker: f64,
}

/// Which side of the liquidity ledger a fill lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityRole {
    /// Order rests on the book.
    Maker,
    /// Order crosses the spread.
    Taker,
}

/// Static tier-to-rates table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    rates: BTreeMap<FeeTier, FeeRates>,
}

impl Default for FeeSchedule {
    /// The reference exchange schedule.
    fn default() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(
            FeeTier::Tier0,
            FeeRates {
                maker: 0.0010,
                taker: 0.0020,
            },
        );
        rates.insert(
            FeeTier::Tier1,
            FeeRates {
                maker: 0.0008,
                taker: 0.0018,
            },
        );
        rates.insert(
            FeeTier::Tier2,
            FeeRates {
                maker: 0.0006,
                taker: 0.0016,
            },
        );
        Self { rates }
    }
}

impl FeeSchedule {
    /// Build a schedule from an explicit tier table.
    #[must_use]
    pub const fn new(rates: BTreeMap<FeeTier, FeeRates>) -> Self {
        Self { rates }
    }

    /// Look up the rates for a tier.
    ///
    /// # Errors
    ///
    /// Returns [`CostModelError::UnknownFeeTier`] when the tier is not
    /// in the schedule.
    pub fn rates(&self, tier: FeeTier) -> Result<FeeRates, CostModelError> {
        self.rates
            .get(&tier)
            .copied()
            .ok_or_else(|| CostModelError::UnknownFeeTier(tier.to_string()))
    }

    /// Fee for a fill: `price * quantity * rate`.
    ///
    /// # Errors
    ///
    /// Returns [`CostModelError::UnknownFeeTier`] when the tier is not
    /// in the schedule.
    pub fn fee(
        &self,
        price: f64,
        quantity: f64,
        tier: FeeTier,
        role: LiquidityRole,
    ) -> Result<f64, CostModelError> {
        let rates = self.rates(tier)?;
        let rate = match role {
            LiquidityRole::Maker => rates.maker,
            LiquidityRole::Taker => rates.taker,
        };
        Ok(price * quantity * rate)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn taker_fee_reference_case() {
        let schedule = FeeSchedule::default();
        let fee = schedule
            .fee(100.0, 2.0, FeeTier::Tier0, LiquidityRole::Taker)
            .unwrap();
        assert!((fee - 0.40).abs() < 1e-12);
    }

    #[test_case(FeeTier::Tier0, 0.0010, 0.0020)]
    #[test_case(FeeTier::Tier1, 0.0008, 0.0018)]
    #[test_case(FeeTier::Tier2, 0.0006, 0.0016)]
    fn default_schedule_rates(tier: FeeTier, maker: f64, taker: f64) {
        let rates = FeeSchedule::default().rates(tier).unwrap();
        assert_eq!(rates.maker, maker);
        assert_eq!(rates.taker, taker);
    }

    #[test]
    fn maker_fee_uses_maker_rate() {
        let schedule = FeeSchedule::default();
        let fee = schedule
            .fee(100.0, 2.0, FeeTier::Tier0, LiquidityRole::Maker)
            .unwrap();
        assert!((fee - 0.20).abs() < 1e-12);
    }

    #[test]
    fn missing_tier_is_an_error() {
        let schedule = FeeSchedule::new(BTreeMap::new());
        let err = schedule
            .fee(100.0, 2.0, FeeTier::Tier0, LiquidityRole::Taker)
            .unwrap_err();
        assert!(matches!(err, CostModelError::UnknownFeeTier(_)));
    }

    #[test_case("Tier 0", FeeTier::Tier0)]
    #[test_case("tier1", FeeTier::Tier1)]
    #[test_case("2", FeeTier::Tier2)]
    #[test_case("TIER 2", FeeTier::Tier2)]
    fn tier_parsing(input: &str, expected: FeeTier) {
        assert_eq!(input.parse::<FeeTier>().unwrap(), expected);
    }

    #[test]
    fn unknown_tier_name_fails_to_parse() {
        let err = "Tier 9".parse::<FeeTier>().unwrap_err();
        assert_eq!(
            err,
            CostModelError::UnknownFeeTier("Tier 9".to_string())
        );
    }

    #[test]
    fn tier_display_round_trips() {
        for tier in [FeeTier::Tier0, FeeTier::Tier1, FeeTier::Tier2] {
            assert_eq!(tier.to_string().parse::<FeeTier>().unwrap(), tier);
        }
    }
}
