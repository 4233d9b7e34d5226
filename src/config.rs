// src/config.rs
//! Pricer configuration.
//!
//! [`PricerConfig`] holds the knobs of a pricing run. It can be built in
//! code with the `with_*` setters or loaded from TOML, where missing keys
//! fall back to [`PricerConfig::default`]:
//!
//! ```toml
//! scenarios = 100000
//! steps = 52
//! tasks = 8
//! seed = 42
//! ```

use crate::error::{validation::*, PricingError, PricingResult};
use crate::rng::DEFAULT_SEED;
use crate::solvers::log_euler::DEFAULT_MAX_BATCH_CELLS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricerConfig {
    /// Total scenarios priced per call
    pub scenarios: usize,
    /// Time steps for path-dependent contracts
    pub steps: usize,
    /// Number of independent pricing tasks the scenarios are split into
    pub tasks: usize,
    /// Upper bound on worker threads
    pub max_concurrency: usize,
    /// Upper bound on paths × steps generated by one simulation call
    pub max_batch_cells: usize,
    /// Seed of the shared random sequence
    pub seed: u64,
}

impl PricerConfig {
    pub fn with_scenarios(mut self, scenarios: usize) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_tasks(mut self, tasks: usize) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_max_batch_cells(mut self, max_batch_cells: usize) -> Self {
        self.max_batch_cells = max_batch_cells;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the pricer configuration
    pub fn validate(&self) -> PricingResult<()> {
        validate_scenarios(self.scenarios)?;
        validate_steps(self.steps)?;
        validate_tasks(self.tasks)?;
        if self.max_concurrency == 0 {
            return Err(PricingError::InvalidConfiguration {
                field: "max_concurrency".to_string(),
                reason: "must allow at least one worker".to_string(),
            });
        }
        if self.max_batch_cells == 0 {
            return Err(PricingError::InvalidConfiguration {
                field: "max_batch_cells".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> PricingResult<Self> {
        let config: PricerConfig =
            toml::from_str(source).map_err(|e| PricingError::InvalidConfiguration {
                field: "toml".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> PricingResult<String> {
        toml::to_string(self).map_err(|e| PricingError::InvalidConfiguration {
            field: "toml".to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for PricerConfig {
    fn default() -> Self {
        let cpus = num_cpus::get().max(1);
        PricerConfig {
            scenarios: 10_000,
            steps: 10,
            tasks: cpus,
            max_concurrency: cpus,
            max_batch_cells: DEFAULT_MAX_BATCH_CELLS,
            seed: DEFAULT_SEED,
        }
    }
}
