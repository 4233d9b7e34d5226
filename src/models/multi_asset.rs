// src/models/multi_asset.rs
//! Correlated Multi-Asset Lognormal Model
//!
//! # Mathematical Framework
//!
//! N assets follow correlated geometric Brownian motions:
//! ```text
//! dS_i = μ_i S_i dt + S_i dX_i,    Cov(dX_i, dX_j) = Σ_ij dt
//! ```
//!
//! Where:
//! - μ_i: Drift of asset i under the physical measure
//! - Σ: Symmetric covariance matrix of the log-returns (Σ_ii = σ_i²)
//!
//! Under the risk-neutral measure every drift is replaced by the risk-free
//! rate `r`. Simulation lives in [`crate::solvers::log_euler`].
//!
//! # Sub-models
//!
//! A contract usually depends on a handful of the assets in a model. Pricing
//! works on [`MultiAssetModel::restrict_to`], which keeps the pairwise
//! covariances, drifts and prices of the retained assets and the model's
//! rate and date.

use super::black_scholes::BlackScholesModel;
use crate::error::{validation::*, PricingError, PricingResult};
use crate::mc::market_simulation::MarketSimulation;
use crate::rng::NormalSource;
use crate::solvers::log_euler::{Measure, PathSimulator};
use ndarray::{arr1, arr2, Array1, Array2};
use std::collections::{BTreeSet, HashMap};

/// Name given to the asset of a single-asset model when none is provided
pub const DEFAULT_ASSET: &str = "Acme";

const SYMMETRY_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct MultiAssetModel {
    asset_names: Vec<String>,
    index: HashMap<String, usize>,
    spots: Array1<f64>,
    drifts: Array1<f64>,
    covariance: Array2<f64>,
    risk_free_rate: f64,
    date: f64,
}

impl MultiAssetModel {
    /// Build a model from named assets, column vectors of spots and drifts
    /// and an N×N covariance matrix. Rate and date start at zero.
    pub fn new(
        asset_names: Vec<String>,
        spots: Array1<f64>,
        drifts: Array1<f64>,
        covariance: Array2<f64>,
    ) -> PricingResult<Self> {
        let n = asset_names.len();
        if n == 0 {
            return Err(PricingError::InvalidModel {
                reason: "a model needs at least one asset".to_string(),
            });
        }
        if spots.len() != n {
            return Err(PricingError::InvalidModel {
                reason: format!("{} spot prices for {} assets", spots.len(), n),
            });
        }
        if drifts.len() != n {
            return Err(PricingError::InvalidModel {
                reason: format!("{} drifts for {} assets", drifts.len(), n),
            });
        }
        if covariance.dim() != (n, n) {
            return Err(PricingError::InvalidModel {
                reason: format!(
                    "covariance matrix is {}x{}, expected {}x{}",
                    covariance.nrows(),
                    covariance.ncols(),
                    n,
                    n
                ),
            });
        }

        let mut index = HashMap::with_capacity(n);
        for (i, name) in asset_names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(PricingError::InvalidModel {
                    reason: format!("asset '{}' appears more than once", name),
                });
            }
        }

        for (name, (&spot, &drift)) in asset_names.iter().zip(spots.iter().zip(drifts.iter())) {
            validate_positive(&format!("spot[{}]", name), spot)?;
            validate_finite(&format!("spot[{}]", name), spot)?;
            validate_finite(&format!("drift[{}]", name), drift)?;
        }

        for i in 0..n {
            validate_non_negative(&format!("variance[{}]", asset_names[i]), covariance[[i, i]])?;
            for j in 0..n {
                let (a, b) = (covariance[[i, j]], covariance[[j, i]]);
                validate_finite("covariance", a)?;
                if (a - b).abs() > SYMMETRY_TOLERANCE * a.abs().max(b.abs()).max(1.0) {
                    return Err(PricingError::InvalidModel {
                        reason: format!(
                            "covariance matrix is not symmetric at ({}, {}): {} vs {}",
                            i, j, a, b
                        ),
                    });
                }
            }
        }

        Ok(MultiAssetModel {
            asset_names,
            index,
            spots,
            drifts,
            covariance,
            risk_free_rate: 0.0,
            date: 0.0,
        })
    }

    /// One-asset model from scalars
    pub fn single_asset(
        asset: &str,
        spot: f64,
        drift: f64,
        volatility: f64,
        risk_free_rate: f64,
        date: f64,
    ) -> PricingResult<Self> {
        validate_non_negative("volatility", volatility)?;
        validate_finite("risk_free_rate", risk_free_rate)?;
        validate_finite("date", date)?;
        Ok(MultiAssetModel::new(
            vec![asset.to_string()],
            arr1(&[spot]),
            arr1(&[drift]),
            arr2(&[[volatility * volatility]]),
        )?
        .with_risk_free_rate(risk_free_rate)
        .with_date(date))
    }

    /// One-asset model named [`DEFAULT_ASSET`]
    pub fn from_black_scholes(bsm: &BlackScholesModel) -> PricingResult<Self> {
        bsm.validate()?;
        Self::single_asset(
            DEFAULT_ASSET,
            bsm.stock_price,
            bsm.drift,
            bsm.volatility,
            bsm.risk_free_rate,
            bsm.date,
        )
    }

    /// Standard three-asset model used throughout the tests
    pub fn create_test_model() -> Self {
        let names = ["Acme", "Bigbank", "Chumhum"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cov = arr2(&[[5.0, 2.0, 1.0], [2.0, 6.0, -1.0], [1.0, -1.0, 7.0]]) * 0.01;
        MultiAssetModel {
            index: HashMap::from([
                ("Acme".to_string(), 0),
                ("Bigbank".to_string(), 1),
                ("Chumhum".to_string(), 2),
            ]),
            asset_names: names,
            spots: arr1(&[100.0, 200.0, 300.0]),
            drifts: arr1(&[0.0, 0.0, 0.0]),
            covariance: cov,
            risk_free_rate: 0.0,
            date: 0.0,
        }
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    pub fn with_date(mut self, date: f64) -> Self {
        self.date = date;
        self
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// The valuation date in years
    pub fn date(&self) -> f64 {
        self.date
    }

    pub fn asset_names(&self) -> &[String] {
        &self.asset_names
    }

    pub fn n_assets(&self) -> usize {
        self.asset_names.len()
    }

    pub fn spots(&self) -> &Array1<f64> {
        &self.spots
    }

    pub fn drifts(&self) -> &Array1<f64> {
        &self.drifts
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    pub fn index_of(&self, asset: &str) -> PricingResult<usize> {
        self.index
            .get(asset)
            .copied()
            .ok_or_else(|| PricingError::InvalidAsset {
                asset: asset.to_string(),
            })
    }

    pub fn spot(&self, asset: &str) -> PricingResult<f64> {
        Ok(self.spots[self.index_of(asset)?])
    }

    pub fn drift(&self, asset: &str) -> PricingResult<f64> {
        Ok(self.drifts[self.index_of(asset)?])
    }

    pub fn volatility(&self, asset: &str) -> PricingResult<f64> {
        let i = self.index_of(asset)?;
        Ok(self.covariance[[i, i]].sqrt())
    }

    /// Sub-model containing exactly the named assets.
    ///
    /// Assets are re-indexed in name order; duplicates collapse.
    pub fn restrict_to<I, S>(&self, assets: I) -> PricingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = assets
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let old: Vec<usize> = names
            .iter()
            .map(|name| self.index_of(name))
            .collect::<PricingResult<_>>()?;

        let n = old.len();
        let spots = Array1::from_shape_fn(n, |i| self.spots[old[i]]);
        let drifts = Array1::from_shape_fn(n, |i| self.drifts[old[i]]);
        let covariance = Array2::from_shape_fn((n, n), |(i, j)| self.covariance[[old[i], old[j]]]);

        Ok(MultiAssetModel::new(names.into_iter().collect(), spots, drifts, covariance)?
            .with_risk_free_rate(self.risk_free_rate)
            .with_date(self.date))
    }

    /// Number of normal draws one simulation of the given shape consumes
    pub fn random_draws_required(&self, n_paths: usize, n_steps: usize) -> u64 {
        self.n_assets() as u64 * n_paths as u64 * n_steps as u64
    }

    /// Extract the 1-d scalar view of one asset
    pub fn black_scholes_model(&self, asset: &str) -> PricingResult<BlackScholesModel> {
        let i = self.index_of(asset)?;
        Ok(BlackScholesModel {
            stock_price: self.spots[i],
            drift: self.drifts[i],
            volatility: self.covariance[[i, i]].sqrt(),
            risk_free_rate: self.risk_free_rate,
            date: self.date,
        })
    }

    /// Simulate up to `to_date` under the physical measure
    pub fn generate_price_paths<S: NormalSource + ?Sized>(
        &self,
        rng: &mut S,
        to_date: f64,
        n_paths: usize,
        n_steps: usize,
    ) -> PricingResult<MarketSimulation> {
        PathSimulator::new(self)?.simulate(rng, to_date, n_paths, n_steps, Measure::Physical)
    }

    /// Simulate up to `to_date` under the risk-neutral measure
    pub fn generate_risk_neutral_price_paths<S: NormalSource + ?Sized>(
        &self,
        rng: &mut S,
        to_date: f64,
        n_paths: usize,
        n_steps: usize,
    ) -> PricingResult<MarketSimulation> {
        PathSimulator::new(self)?.simulate(rng, to_date, n_paths, n_steps, Measure::RiskNeutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let err = MultiAssetModel::new(
            names(&["A", "B"]),
            arr1(&[100.0, 50.0]),
            arr1(&[0.0]),
            Array2::eye(2),
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::InvalidModel { .. }));

        let err = MultiAssetModel::new(
            names(&["A", "B"]),
            arr1(&[100.0, 50.0]),
            arr1(&[0.0, 0.0]),
            Array2::eye(3),
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::InvalidModel { .. }));
    }

    #[test]
    fn test_asymmetric_covariance_is_rejected() {
        let err = MultiAssetModel::new(
            names(&["A", "B"]),
            arr1(&[100.0, 50.0]),
            arr1(&[0.0, 0.0]),
            arr2(&[[0.04, 0.01], [0.02, 0.09]]),
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::InvalidModel { .. }));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        assert!(MultiAssetModel::new(
            names(&["A", "A"]),
            arr1(&[100.0, 50.0]),
            arr1(&[0.0, 0.0]),
            Array2::eye(2),
        )
        .is_err());
    }

    #[test]
    fn test_restrict_preserves_covariance_structure() {
        let model = MultiAssetModel::create_test_model()
            .with_risk_free_rate(0.03)
            .with_date(0.5);
        let sub = model.restrict_to(["Chumhum", "Acme"]).unwrap();

        assert_eq!(sub.asset_names(), &["Acme".to_string(), "Chumhum".to_string()]);
        assert_abs_diff_eq!(sub.covariance()[[0, 0]], 0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(sub.covariance()[[1, 1]], 0.07, epsilon = 1e-15);
        assert_abs_diff_eq!(sub.covariance()[[0, 1]], 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(sub.covariance()[[1, 0]], 0.01, epsilon = 1e-15);
        assert_eq!(sub.spot("Chumhum").unwrap(), 300.0);
        assert_eq!(sub.risk_free_rate(), 0.03);
        assert_eq!(sub.date(), 0.5);
    }

    #[test]
    fn test_restrict_to_unknown_asset_fails() {
        let model = MultiAssetModel::create_test_model();
        let err = model.restrict_to(["Acme", "Hooli"]).unwrap_err();
        assert_eq!(
            err,
            PricingError::InvalidAsset {
                asset: "Hooli".to_string()
            }
        );
    }

    #[test]
    fn test_random_draws_required() {
        let model = MultiAssetModel::create_test_model();
        assert_eq!(model.random_draws_required(1000, 12), 36_000);
        let sub = model.restrict_to(["Bigbank"]).unwrap();
        assert_eq!(sub.random_draws_required(1000, 12), 12_000);
    }

    #[test]
    fn test_black_scholes_view_round_trip() {
        let bsm = BlackScholesModel {
            stock_price: 95.0,
            drift: 0.07,
            volatility: 0.25,
            risk_free_rate: 0.02,
            date: 1.5,
        };
        let model = MultiAssetModel::from_black_scholes(&bsm).unwrap();
        assert_eq!(model.asset_names(), &[DEFAULT_ASSET.to_string()]);
        let back = model.black_scholes_model(DEFAULT_ASSET).unwrap();
        assert_abs_diff_eq!(back.volatility, 0.25, epsilon = 1e-15);
        assert_eq!(back.stock_price, 95.0);
        assert_eq!(back.date, 1.5);
        assert!(model.black_scholes_model("Other").is_err());
    }
}
