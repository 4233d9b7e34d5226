// src/mc/contracts/barrier.rs
//! Knock-in and knock-out barrier options.
//!
//! The barrier is monitored at the spot on the valuation date and at every
//! simulated step. Between steps the path is not observed, so a discretely
//! monitored barrier is hit less often than a continuous one and prices
//! differ from continuous-barrier formulas by a bias that shrinks with the
//! step size. No continuity correction is applied.

use crate::error::{PricingError, PricingResult};
use crate::mc::market_simulation::MarketSimulation;
use crate::mc::payoffs::{validate_maturity, validate_strike, ContinuousTimeContract, OptionKind};
use crate::models::multi_asset::DEFAULT_ASSET;
use ndarray::Array1;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierDirection {
    /// Hit when the price is at or above the barrier
    Up,
    /// Hit when the price is at or below the barrier
    Down,
}

impl BarrierDirection {
    #[inline]
    pub fn is_hit(self, price: f64, barrier: f64) -> bool {
        match self {
            BarrierDirection::Up => price >= barrier,
            BarrierDirection::Down => price <= barrier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockType {
    /// Pays only if the barrier was hit
    In,
    /// Pays only if the barrier was never hit
    Out,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarrierOption {
    asset: String,
    kind: OptionKind,
    direction: BarrierDirection,
    knock: KnockType,
    strike: f64,
    barrier: f64,
    maturity: f64,
}

impl BarrierOption {
    pub fn new(
        asset: impl Into<String>,
        kind: OptionKind,
        direction: BarrierDirection,
        knock: KnockType,
        strike: f64,
        barrier: f64,
        maturity: f64,
    ) -> PricingResult<Self> {
        validate_strike("barrier option", strike)?;
        validate_maturity("barrier option", maturity)?;
        if barrier.is_nan() {
            return Err(PricingError::InvalidParameters {
                parameter: "barrier".to_string(),
                value: barrier,
                constraint: "must be a number".to_string(),
            });
        }
        Ok(BarrierOption {
            asset: asset.into(),
            kind,
            direction,
            knock,
            strike,
            barrier,
            maturity,
        })
    }

    /// Up-and-out call on the default asset
    pub fn up_and_out(strike: f64, barrier: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(
            DEFAULT_ASSET,
            OptionKind::Call,
            BarrierDirection::Up,
            KnockType::Out,
            strike,
            barrier,
            maturity,
        )
    }

    /// Up-and-in call on the default asset
    pub fn up_and_in(strike: f64, barrier: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(
            DEFAULT_ASSET,
            OptionKind::Call,
            BarrierDirection::Up,
            KnockType::In,
            strike,
            barrier,
            maturity,
        )
    }

    /// Down-and-out call on the default asset
    pub fn down_and_out(strike: f64, barrier: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(
            DEFAULT_ASSET,
            OptionKind::Call,
            BarrierDirection::Down,
            KnockType::Out,
            strike,
            barrier,
            maturity,
        )
    }

    /// Down-and-in call on the default asset
    pub fn down_and_in(strike: f64, barrier: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(
            DEFAULT_ASSET,
            OptionKind::Call,
            BarrierDirection::Down,
            KnockType::In,
            strike,
            barrier,
            maturity,
        )
    }

    /// Same contract written on a different asset
    pub fn on_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = asset.into();
        self
    }

    /// Same contract with a put payoff
    pub fn with_kind(mut self, kind: OptionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn barrier(&self) -> f64 {
        self.barrier
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn direction(&self) -> BarrierDirection {
        self.direction
    }

    pub fn knock(&self) -> KnockType {
        self.knock
    }
}

impl ContinuousTimeContract for BarrierOption {
    fn name(&self) -> &str {
        match (self.direction, self.knock) {
            (BarrierDirection::Up, KnockType::Out) => "up-and-out option",
            (BarrierDirection::Up, KnockType::In) => "up-and-in option",
            (BarrierDirection::Down, KnockType::Out) => "down-and-out option",
            (BarrierDirection::Down, KnockType::In) => "down-and-in option",
        }
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
        let hit_at_spot = self
            .direction
            .is_hit(simulation.spot(&self.asset)?, self.barrier);
        let last = simulation.n_steps() - 1;

        Ok(prices
            .outer_iter()
            .map(|path| {
                let hit = hit_at_spot
                    || path
                        .iter()
                        .any(|&p| self.direction.is_hit(p, self.barrier));
                let alive = match self.knock {
                    KnockType::In => hit,
                    KnockType::Out => !hit,
                };
                if alive {
                    self.kind.intrinsic(path[last], self.strike)
                } else {
                    0.0
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    fn single_path(spot: f64, prices: [f64; 2]) -> MarketSimulation {
        MarketSimulation::builder(1, 2)
            .with_asset(DEFAULT_ASSET, spot, arr2(&[prices]))
            .and_then(|b| b.build())
            .unwrap()
    }

    #[test]
    fn test_up_and_out_payoff() {
        let o = BarrierOption::up_and_out(70.0, 100.0, 1.0).unwrap();
        assert_eq!(o.payoff(&single_path(50.0, [120.0, 80.0])).unwrap()[0], 0.0);
        assert_eq!(o.payoff(&single_path(50.0, [90.0, 80.0])).unwrap()[0], 10.0);
        assert_eq!(o.payoff(&single_path(50.0, [90.0, 60.0])).unwrap()[0], 0.0);
    }

    #[test]
    fn test_up_and_in_payoff() {
        let o = BarrierOption::up_and_in(70.0, 100.0, 1.0).unwrap();
        assert_eq!(o.payoff(&single_path(50.0, [120.0, 80.0])).unwrap()[0], 10.0);
        assert_eq!(o.payoff(&single_path(50.0, [90.0, 80.0])).unwrap()[0], 0.0);
        assert_eq!(o.payoff(&single_path(50.0, [90.0, 60.0])).unwrap()[0], 0.0);
    }

    #[test]
    fn test_down_and_out_payoff() {
        let o = BarrierOption::down_and_out(70.0, 50.0, 1.0).unwrap();
        assert_eq!(o.payoff(&single_path(100.0, [120.0, 80.0])).unwrap()[0], 10.0);
        assert_eq!(o.payoff(&single_path(100.0, [40.0, 80.0])).unwrap()[0], 0.0);
    }

    #[test]
    fn test_spot_through_barrier_knocks_out_immediately() {
        let o = BarrierOption::up_and_out(70.0, 100.0, 1.0).unwrap();
        assert_eq!(o.payoff(&single_path(100.0, [90.0, 80.0])).unwrap()[0], 0.0);
        let i = BarrierOption::up_and_in(70.0, 100.0, 1.0).unwrap();
        assert_eq!(i.payoff(&single_path(100.0, [90.0, 80.0])).unwrap()[0], 10.0);
    }

    #[test]
    fn test_in_plus_out_is_vanilla() {
        let prices = Array2::from_shape_fn((50, 4), |(i, j)| 80.0 + (i as f64 * 7.0 + j as f64 * 13.0) % 45.0);
        let sim = MarketSimulation::builder(50, 4)
            .with_asset(DEFAULT_ASSET, 95.0, prices)
            .and_then(|b| b.build())
            .unwrap();
        let out = BarrierOption::up_and_out(100.0, 115.0, 1.0).unwrap();
        let inn = BarrierOption::up_and_in(100.0, 115.0, 1.0).unwrap();
        let finals = sim.final_prices(DEFAULT_ASSET).unwrap();
        let total = out.payoff(&sim).unwrap() + inn.payoff(&sim).unwrap();
        for (i, &s) in finals.iter().enumerate() {
            assert_eq!(total[i], (s - 100.0).max(0.0));
        }
    }

    #[test]
    fn test_put_underlying() {
        let o = BarrierOption::down_and_out(100.0, 60.0, 1.0)
            .unwrap()
            .with_kind(OptionKind::Put);
        assert_eq!(o.payoff(&single_path(90.0, [85.0, 75.0])).unwrap()[0], 25.0);
        assert_eq!(o.payoff(&single_path(90.0, [55.0, 75.0])).unwrap()[0], 0.0);
    }
}
