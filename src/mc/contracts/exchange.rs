// src/mc/contracts/exchange.rs
use crate::error::{PricingError, PricingResult};
use crate::mc::market_simulation::MarketSimulation;
use crate::mc::payoffs::{validate_maturity, ContinuousTimeContract};
use ndarray::Array1;
use std::collections::BTreeSet;

/// Margrabe exchange option: the right to swap the second asset for the
/// first at maturity, paying max(S1_T - S2_T, 0).
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOption {
    long_asset: String,
    short_asset: String,
    maturity: f64,
}

impl ExchangeOption {
    pub fn new(
        long_asset: impl Into<String>,
        short_asset: impl Into<String>,
        maturity: f64,
    ) -> PricingResult<Self> {
        validate_maturity("exchange option", maturity)?;
        let (long_asset, short_asset) = (long_asset.into(), short_asset.into());
        if long_asset == short_asset {
            return Err(PricingError::InvalidConfiguration {
                field: "exchange option assets".to_string(),
                reason: format!("both legs reference '{}'", long_asset),
            });
        }
        Ok(ExchangeOption {
            long_asset,
            short_asset,
            maturity,
        })
    }

    pub fn long_asset(&self) -> &str {
        &self.long_asset
    }

    pub fn short_asset(&self) -> &str {
        &self.short_asset
    }
}

impl ContinuousTimeContract for ExchangeOption {
    fn name(&self) -> &str {
        "exchange option"
    }

    fn maturity(&self) -> f64 {
        self.maturity
    }

    fn dependent_assets(&self) -> BTreeSet<String> {
        BTreeSet::from([self.long_asset.clone(), self.short_asset.clone()])
    }

    fn is_path_dependent(&self) -> bool {
        false
    }

    fn payoff(&self, simulation: &MarketSimulation) -> PricingResult<Array1<f64>> {
        let long = simulation.final_prices(&self.long_asset)?;
        let short = simulation.final_prices(&self.short_asset)?;
        Ok((&long - &short).mapv(|d| d.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn two_asset_sim() -> MarketSimulation {
        MarketSimulation::builder(2, 2)
            .with_asset("Stock1", 100.0, arr2(&[[100.0, 110.0], [100.0, 90.0]]))
            .and_then(|b| b.with_asset("Stock2", 99.0, arr2(&[[99.0, 100.0], [99.0, 95.0]])))
            .and_then(|b| b.build())
            .unwrap()
    }

    #[test]
    fn test_spread_payoff() {
        let option = ExchangeOption::new("Stock1", "Stock2", 1.0).unwrap();
        assert_eq!(option.payoff(&two_asset_sim()).unwrap().to_vec(), vec![10.0, 0.0]);
        assert_eq!(option.dependent_assets().len(), 2);
    }

    #[test]
    fn test_missing_leg() {
        let option = ExchangeOption::new("Stock1", "Stock3", 1.0).unwrap();
        assert!(matches!(
            option.payoff(&two_asset_sim()),
            Err(PricingError::MissingAsset { ref asset, .. }) if asset == "Stock3"
        ));
    }

    #[test]
    fn test_same_asset_rejected() {
        assert!(ExchangeOption::new("Stock1", "Stock1", 1.0).is_err());
    }
}
