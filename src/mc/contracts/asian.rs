// src/mc/contracts/asian.rs
use crate::error::PricingResult;
use crate::mc::market_simulation::MarketSimulation;
use crate::mc::payoffs::{validate_maturity, validate_strike, ContinuousTimeContract, OptionKind};
use crate::models::multi_asset::DEFAULT_ASSET;
use ndarray::{Array1, Axis};
use std::collections::BTreeSet;

/// Average-price option: max(A - K, 0) for calls where
/// A = (1/n) Σ S(t_i) over the simulated steps.
///
/// The spot at the valuation date is not part of the average.
#[derive(Debug, Clone, PartialEq)]
pub struct AsianOption {
    asset: String,
    kind: OptionKind,
    strike: f64,
    maturity: f64,
}

impl AsianOption {
    pub fn new(
        asset: impl Into<String>,
        kind: OptionKind,
        strike: f64,
        maturity: f64,
    ) -> PricingResult<Self> {
        validate_strike("asian option", strike)?;
        validate_maturity("asian option", maturity)?;
        Ok(AsianOption {
            asset: asset.into(),
            kind,
            strike,
            maturity,
        })
    }

    pub fn call(strike: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(DEFAULT_ASSET, OptionKind::Call, strike, maturity)
    }

    pub fn put(strike: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(DEFAULT_ASSET, OptionKind::Put, strike, maturity)
    }
}

impl ContinuousTimeContract for AsianOption {
    fn name(&self) -> &str {
        "asian option"
    }

    fn maturity(&self) -> f64 {
        self.maturity
    }

    fn dependent_assets(&self) -> BTreeSet<String> {
        BTreeSet::from([self.asset.clone()])
    }

    fn is_path_dependent(&self) -> bool {
        true
    }

    fn payoff(&self, simulation: &MarketSimulation) -> PricingResult<Array1<f64>> {
        let prices = simulation.prices(&self.asset)?;
        let n = prices.ncols() as f64;
        Ok(prices
            .sum_axis(Axis(1))
            .mapv(|total| self.kind.intrinsic(total / n, self.strike)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    #[test]
    fn test_average_over_all_steps() {
        let sim = MarketSimulation::builder(2, 4)
            .with_asset(
                DEFAULT_ASSET,
                1000.0,
                arr2(&[[90.0, 100.0, 110.0, 120.0], [80.0, 90.0, 100.0, 150.0]]),
            )
            .and_then(|b| b.build())
            .unwrap();
        let call = AsianOption::call(100.0, 1.0).unwrap().payoff(&sim).unwrap();
        assert_abs_diff_eq!(call[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(call[1], 5.0, epsilon = 1e-12);

        let put = AsianOption::put(110.0, 1.0).unwrap().payoff(&sim).unwrap();
        assert_abs_diff_eq!(put[0], 5.0, epsilon = 1e-12);
    }
}
