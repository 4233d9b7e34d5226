// src/solvers/log_euler.rs
//! Correlated Log-Euler Path Simulation
//!
//! # Mathematical Framework
//!
//! For N correlated lognormal assets with drift vector μ and covariance Σ,
//! the log-prices advance over a step Δt as:
//! ```text
//! ln S_i(t+Δt) = ln S_i(t) + (μ_i - ½Σ_ii) Δt + √Δt (A ε)_i
//! ```
//!
//! Where:
//! - `A` is the lower-triangular Cholesky factor, `A Aᵀ = Σ`
//! - `ε ~ N(0, I)` are independent standard normal draws
//!
//! Accumulation happens entirely in log-space; prices are only
//! exponentiated when written to the output matrices. For constant
//! coefficients the scheme is exact at the grid points.
//!
//! # Draw Layout
//!
//! Draws are consumed path-major: all steps of path 0 (N draws per step),
//! then path 1, and so on. A batch of `p` paths therefore uses a contiguous
//! run of `p × steps × N` draws, so splitting a scenario range into batches
//! or tasks never changes which draws a scenario sees.
//!
//! # Memory Policy
//!
//! A single call may produce at most `max_batch_cells` (paths × steps)
//! cells per asset; callers split larger requests into sequential batches.

use crate::error::{validation::*, PricingError, PricingResult};
use crate::mc::market_simulation::MarketSimulation;
use crate::models::multi_asset::MultiAssetModel;
use crate::rng::NormalSource;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use tracing::trace;

/// Default upper bound on paths × steps per simulation call
pub const DEFAULT_MAX_BATCH_CELLS: usize = 10_000_000;

/// Which drift the simulation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Model drifts (P measure)
    Physical,
    /// Risk-free rate for every asset (Q measure)
    RiskNeutral,
}

/// Relative tolerance under which a Cholesky pivot counts as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Lower-triangular Cholesky factor of a covariance matrix.
///
/// Positive semi-definite matrices are accepted: an asset with no variance
/// left after the preceding columns gets a zero column.
pub fn cholesky(covariance: &Array2<f64>) -> PricingResult<Array2<f64>> {
    let n = covariance.nrows();
    let matrix = DMatrix::from_fn(n, n, |i, j| covariance[[i, j]]);
    match matrix.cholesky() {
        Some(factor) => {
            let l = factor.l();
            Ok(Array2::from_shape_fn((n, n), |(i, j)| l[(i, j)]))
        }
        None => semidefinite_cholesky(covariance),
    }
}

fn semidefinite_cholesky(covariance: &Array2<f64>) -> PricingResult<Array2<f64>> {
    let n = covariance.nrows();
    let scale = covariance
        .diag()
        .iter()
        .fold(0.0_f64, |m, &v| m.max(v.abs()));
    let tolerance = PIVOT_TOLERANCE * scale.max(f64::MIN_POSITIVE);
    let not_pd = || PricingError::NotPositiveDefinite { dimension: n };

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let pivot = covariance[[j, j]] - (0..j).map(|k| l[[j, k]] * l[[j, k]]).sum::<f64>();
        if !pivot.is_finite() || pivot < -tolerance {
            return Err(not_pd());
        }
        if pivot <= tolerance {
            for i in (j + 1)..n {
                let rest =
                    covariance[[i, j]] - (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum::<f64>();
                if rest.abs() > tolerance {
                    return Err(not_pd());
                }
            }
            continue;
        }
        let d = pivot.sqrt();
        l[[j, j]] = d;
        for i in (j + 1)..n {
            let rest = covariance[[i, j]] - (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum::<f64>();
            l[[i, j]] = rest / d;
        }
    }
    Ok(l)
}

/// Generates jointly correlated price paths for every asset of a model.
///
/// The covariance matrix is factorised once at construction; the simulator
/// can then be shared read-only between threads.
#[derive(Debug, Clone)]
pub struct PathSimulator<'m> {
    model: &'m MultiAssetModel,
    factor: Array2<f64>,
    max_batch_cells: usize,
}

impl<'m> PathSimulator<'m> {
    pub fn new(model: &'m MultiAssetModel) -> PricingResult<Self> {
        let factor = cholesky(model.covariance())?;
        Ok(PathSimulator {
            model,
            factor,
            max_batch_cells: DEFAULT_MAX_BATCH_CELLS,
        })
    }

    pub fn with_max_batch_cells(mut self, max_batch_cells: usize) -> Self {
        self.max_batch_cells = max_batch_cells.max(1);
        self
    }

    pub fn max_batch_cells(&self) -> usize {
        self.max_batch_cells
    }

    pub fn model(&self) -> &'m MultiAssetModel {
        self.model
    }

    pub fn cholesky_factor(&self) -> &Array2<f64> {
        &self.factor
    }

    /// Largest number of paths one call can produce at `n_steps` steps
    pub fn paths_per_batch(&self, n_steps: usize) -> usize {
        (self.max_batch_cells / n_steps.max(1)).max(1)
    }

    /// Simulate `n_paths` scenarios on an equally spaced grid of `n_steps`
    /// steps from the model date to `to_date`.
    pub fn simulate<S: NormalSource + ?Sized>(
        &self,
        rng: &mut S,
        to_date: f64,
        n_paths: usize,
        n_steps: usize,
        measure: Measure,
    ) -> PricingResult<MarketSimulation> {
        validate_steps(n_steps)?;
        validate_finite("to_date", to_date)?;
        let horizon = to_date - self.model.date();
        validate_non_negative("to_date - model date", horizon)?;
        if n_paths.saturating_mul(n_steps) > self.max_batch_cells {
            return Err(PricingError::InvalidConfiguration {
                field: "batch".to_string(),
                reason: format!(
                    "{} paths x {} steps exceeds the limit of {} cells per simulation",
                    n_paths, n_steps, self.max_batch_cells
                ),
            });
        }

        let n_assets = self.model.n_assets();
        trace!(n_paths, n_steps, n_assets, ?measure, "simulating batch");
        let dt = horizon / n_steps as f64;
        let root_dt = dt.sqrt();
        let covariance = self.model.covariance();
        let r = self.model.risk_free_rate();

        // (μ_i - ½σ_i²) Δt
        let drift_term: Array1<f64> = Array1::from_shape_fn(n_assets, |j| {
            let mu = match measure {
                Measure::Physical => self.model.drifts()[j],
                Measure::RiskNeutral => r,
            };
            (mu - 0.5 * covariance[[j, j]]) * dt
        });
        let log_spots = self.model.spots().mapv(f64::ln);

        let mut outputs: Vec<Array2<f64>> = (0..n_assets)
            .map(|_| Array2::zeros((n_paths, n_steps)))
            .collect();
        let mut epsilons = vec![0.0; n_assets];
        let mut log_prices = vec![0.0; n_assets];

        for path in 0..n_paths {
            log_prices
                .iter_mut()
                .zip(log_spots.iter())
                .for_each(|(x, &s)| *x = s);

            for step in 0..n_steps {
                rng.fill_normal(&mut epsilons);
                for j in 0..n_assets {
                    // (A ε)_j, A lower triangular
                    let mut shock = 0.0;
                    for k in 0..=j {
                        shock += self.factor[[j, k]] * epsilons[k];
                    }
                    log_prices[j] += drift_term[j] + root_dt * shock;
                    outputs[j][[path, step]] = log_prices[j].exp();
                }
            }
        }

        let mut builder = MarketSimulation::builder(n_paths, n_steps);
        for ((name, spot), prices) in self
            .model
            .asset_names()
            .iter()
            .zip(self.model.spots().iter())
            .zip(outputs)
        {
            builder = builder.with_asset(name.clone(), *spot, prices)?;
        }
        builder.build()
    }
}
