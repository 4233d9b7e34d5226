// src/mc/market_simulation.rs
//! Simulated market states handed to payoff evaluation.
//!
//! Each asset maps to a price matrix: rows are independent scenarios,
//! columns are time steps in increasing order, the final column being the
//! price at the simulation horizon. The spot at the valuation date is kept
//! alongside so barrier monitoring can start from it.
//!
//! All matrices in one simulation share the same shape. A simulation is
//! assembled once through [`MarketSimulationBuilder`] and never mutated.

use crate::error::{PricingError, PricingResult};
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
struct SimulatedAsset {
    spot: f64,
    prices: Array2<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSimulation {
    assets: BTreeMap<String, SimulatedAsset>,
    n_scenarios: usize,
    n_steps: usize,
}

impl MarketSimulation {
    pub fn builder(n_scenarios: usize, n_steps: usize) -> MarketSimulationBuilder {
        MarketSimulationBuilder {
            assets: BTreeMap::new(),
            n_scenarios,
            n_steps,
        }
    }

    pub fn n_scenarios(&self) -> usize {
        self.n_scenarios
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.assets.contains_key(asset)
    }

    fn lookup(&self, asset: &str) -> PricingResult<&SimulatedAsset> {
        self.assets
            .get(asset)
            .ok_or_else(|| PricingError::MissingAsset {
                asset: asset.to_string(),
                context: format!("simulation holds {:?}", self.assets.keys().collect::<Vec<_>>()),
            })
    }

    /// Scenario × step price matrix of one asset
    pub fn prices(&self, asset: &str) -> PricingResult<&Array2<f64>> {
        Ok(&self.lookup(asset)?.prices)
    }

    /// Price of the asset at the valuation date
    pub fn spot(&self, asset: &str) -> PricingResult<f64> {
        Ok(self.lookup(asset)?.spot)
    }

    /// Column of prices at the simulation horizon
    pub fn final_prices(&self, asset: &str) -> PricingResult<ArrayView1<'_, f64>> {
        let prices = self.prices(asset)?;
        Ok(prices.index_axis(Axis(1), self.n_steps - 1))
    }
}

pub struct MarketSimulationBuilder {
    assets: BTreeMap<String, SimulatedAsset>,
    n_scenarios: usize,
    n_steps: usize,
}

impl MarketSimulationBuilder {
    /// Add an asset's paths; the matrix must be `n_scenarios × n_steps`
    pub fn with_asset(
        mut self,
        asset: impl Into<String>,
        spot: f64,
        prices: Array2<f64>,
    ) -> PricingResult<Self> {
        let asset = asset.into();
        if prices.dim() != (self.n_scenarios, self.n_steps) {
            return Err(PricingError::InvalidConfiguration {
                field: format!("simulation[{}]", asset),
                reason: format!(
                    "price matrix is {}x{}, expected {}x{}",
                    prices.nrows(),
                    prices.ncols(),
                    self.n_scenarios,
                    self.n_steps
                ),
            });
        }
        if self.assets.contains_key(&asset) {
            return Err(PricingError::InvalidConfiguration {
                field: format!("simulation[{}]", asset),
                reason: "asset added twice".to_string(),
            });
        }
        self.assets.insert(asset, SimulatedAsset { spot, prices });
        Ok(self)
    }

    pub fn build(self) -> PricingResult<MarketSimulation> {
        if self.n_steps == 0 {
            return Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "a simulation needs at least one time step".to_string(),
            });
        }
        Ok(MarketSimulation {
            assets: self.assets,
            n_scenarios: self.n_scenarios,
            n_steps: self.n_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_final_prices_reads_last_column() {
        let sim = MarketSimulation::builder(2, 3)
            .with_asset("Acme", 100.0, arr2(&[[101.0, 102.0, 103.0], [99.0, 98.0, 97.0]]))
            .and_then(|b| b.build())
            .unwrap();
        let last = sim.final_prices("Acme").unwrap();
        assert_eq!(last.to_vec(), vec![103.0, 97.0]);
        assert_eq!(sim.spot("Acme").unwrap(), 100.0);
        assert_eq!(sim.n_scenarios(), 2);
        assert_eq!(sim.n_steps(), 3);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = MarketSimulation::builder(2, 3).with_asset("Acme", 100.0, Array2::zeros((2, 2)));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_asset() {
        let sim = MarketSimulation::builder(1, 1).build().unwrap();
        assert!(matches!(
            sim.prices("Acme"),
            Err(PricingError::MissingAsset { .. })
        ));
    }
}
