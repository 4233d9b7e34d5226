// src/mc/payoffs.rs
//! Contract Payoff Protocol
//!
//! # Mathematical Definitions
//!
//! A contract is priced from a [`MarketSimulation`]: a matrix of simulated
//! prices per asset, one row per scenario. The payoff evaluator returns one
//! value per scenario.
//!
//! ## Path-Independent Options
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)
//! - **Exchange**: max(S1_T - S2_T, 0)
//!
//! ## Path-Dependent Options
//! - **Asian**: intrinsic value of the arithmetic average of the sampled prices
//! - **Barrier**: vanilla payoff switched on or off by the path crossing a level
//!
//! # Implementation Notes
//!
//! Contracts are independent types implementing [`ContinuousTimeContract`];
//! the pricer only sees the trait object.

use crate::error::{PricingError, PricingResult};
use crate::mc::market_simulation::MarketSimulation;
use ndarray::Array1;
use std::collections::BTreeSet;

/// Direction of a vanilla payoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// max(S - K, 0) for calls, max(K - S, 0) for puts
    #[inline]
    pub fn intrinsic(self, price: f64, strike: f64) -> f64 {
        match self {
            OptionKind::Call => (price - strike).max(0.0),
            OptionKind::Put => (strike - price).max(0.0),
        }
    }
}

/// A priceable instrument whose payoff is read off simulated price paths.
pub trait ContinuousTimeContract: Send + Sync {
    /// Short human-readable label, used in errors and logs
    fn name(&self) -> &str;

    /// Maturity in the same time unit as the model date
    fn maturity(&self) -> f64;

    /// Assets the payoff reads from the simulation
    fn dependent_assets(&self) -> BTreeSet<String>;

    /// Whether the payoff needs prices before maturity
    fn is_path_dependent(&self) -> bool;

    /// Per-scenario payoff, one entry per simulation row
    fn payoff(&self, simulation: &MarketSimulation) -> PricingResult<Array1<f64>>;
}

/// Apply a vanilla payoff to the final column of one asset
pub fn terminal_payoff(
    simulation: &MarketSimulation,
    asset: &str,
    kind: OptionKind,
    strike: f64,
) -> PricingResult<Array1<f64>> {
    Ok(simulation
        .final_prices(asset)?
        .mapv(|s| kind.intrinsic(s, strike)))
}

pub(crate) fn validate_strike(contract: &str, strike: f64) -> PricingResult<()> {
    if !strike.is_finite() || strike < 0.0 {
        return Err(PricingError::InvalidParameters {
            parameter: format!("{} strike", contract),
            value: strike,
            constraint: "must be finite and non-negative".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_maturity(contract: &str, maturity: f64) -> PricingResult<()> {
    if !maturity.is_finite() {
        return Err(PricingError::InvalidParameters {
            parameter: format!("{} maturity", contract),
            value: maturity,
            constraint: "must be finite".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_intrinsic_values() {
        assert_eq!(OptionKind::Call.intrinsic(120.0, 100.0), 20.0);
        assert_eq!(OptionKind::Call.intrinsic(80.0, 100.0), 0.0);
        assert_eq!(OptionKind::Put.intrinsic(80.0, 100.0), 20.0);
        assert_eq!(OptionKind::Put.intrinsic(120.0, 100.0), 0.0);
    }

    #[test]
    fn test_terminal_payoff_ignores_earlier_steps() {
        let sim = MarketSimulation::builder(2, 2)
            .with_asset("Acme", 100.0, arr2(&[[500.0, 105.0], [0.1, 95.0]]))
            .and_then(|b| b.build())
            .unwrap();
        let calls = terminal_payoff(&sim, "Acme", OptionKind::Call, 100.0).unwrap();
        assert_eq!(calls.to_vec(), vec![5.0, 0.0]);
        assert!(terminal_payoff(&sim, "Other", OptionKind::Call, 100.0).is_err());
    }
}
