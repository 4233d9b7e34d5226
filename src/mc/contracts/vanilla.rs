// src/mc/contracts/vanilla.rs
use crate::error::PricingResult;
use crate::mc::market_simulation::MarketSimulation;
use crate::mc::payoffs::{
    terminal_payoff, validate_maturity, validate_strike, ContinuousTimeContract, OptionKind,
};
use crate::models::multi_asset::DEFAULT_ASSET;
use ndarray::Array1;
use std::collections::BTreeSet;

/// European call or put on a single asset
#[derive(Debug, Clone, PartialEq)]
pub struct VanillaOption {
    asset: String,
    kind: OptionKind,
    strike: f64,
    maturity: f64,
}

impl VanillaOption {
    pub fn new(
        asset: impl Into<String>,
        kind: OptionKind,
        strike: f64,
        maturity: f64,
    ) -> PricingResult<Self> {
        validate_strike("vanilla option", strike)?;
        validate_maturity("vanilla option", maturity)?;
        Ok(VanillaOption {
            asset: asset.into(),
            kind,
            strike,
            maturity,
        })
    }

    /// Call on the default asset
    pub fn call(strike: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(DEFAULT_ASSET, OptionKind::Call, strike, maturity)
    }

    /// Put on the default asset
    pub fn put(strike: f64, maturity: f64) -> PricingResult<Self> {
        Self::new(DEFAULT_ASSET, OptionKind::Put, strike, maturity)
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }
}

impl ContinuousTimeContract for VanillaOption {
    fn name(&self) -> &str {
        match self.kind {
            OptionKind::Call => "call option",
            OptionKind::Put => "put option",
        }
    }

    fn maturity(&self) -> f64 {
        self.maturity
    }

    fn dependent_assets(&self) -> BTreeSet<String> {
        BTreeSet::from([self.asset.clone()])
    }

    fn is_path_dependent(&self) -> bool {
        false
    }

    fn payoff(&self, simulation: &MarketSimulation) -> PricingResult<Array1<f64>> {
        terminal_payoff(simulation, &self.asset, self.kind, self.strike)
    }
}
