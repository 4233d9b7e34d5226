// src/mc/mc_engine.rs
//! Parallel Monte Carlo pricing
//!
//! # Math Framework
//!
//! The price of a contract maturing at T is the discounted risk-neutral
//! expectation of its payoff:
//! ```text
//! V = e^(-r(T - t₀)) * E^Q[payoff]  ≈  e^(-r(T - t₀)) * (1/N) Σ payoff_i
//! ```
//! where t₀ is the model date and N the total number of scenarios.
//!
//! # Parallel Decomposition
//!
//! The N scenarios are split into contiguous ranges, one per pricing task.
//! Task k starts at scenario `start_k` and reads its draws from the shared
//! random sequence after skipping `start_k × draws_per_scenario` variates.
//! Since a scenario always consumes the same run of draws, the set of
//! simulated paths is identical for every task count; only the order of the
//! final summation changes.
//!
//! Each task further splits its range into sub-batches of at most
//! `max_batch_cells / steps` paths, so memory use per task is bounded
//! regardless of the scenario count.
//!
//! # Errors
//!
//! Configuration and model errors are raised before any task is scheduled.
//! If a task fails, the other tasks stop at their next sub-batch and the
//! whole call fails; no partial average is ever returned.

use crate::config::PricerConfig;
use crate::error::{validation::*, PricingError, PricingResult};
use crate::executor::TaskExecutor;
use crate::math_utils::Timer;
use crate::mc::payoffs::ContinuousTimeContract;
use crate::models::multi_asset::MultiAssetModel;
use crate::rng::RngFactory;
use crate::solvers::log_euler::{Measure, PathSimulator};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A contiguous range of scenarios priced by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingTask {
    pub index: usize,
    pub start_scenario: usize,
    pub n_scenarios: usize,
}

/// Split `total_scenarios` into at most `n_tasks` contiguous ranges.
///
/// The first `total_scenarios % n_tasks` tasks receive one extra scenario.
/// Empty ranges are omitted, so fewer tasks come back when there are more
/// tasks than scenarios.
pub fn split_scenarios(total_scenarios: usize, n_tasks: usize) -> Vec<PricingTask> {
    if n_tasks == 0 {
        return Vec::new();
    }
    let base = total_scenarios / n_tasks;
    let remainder = total_scenarios % n_tasks;
    let mut start = 0;
    (0..n_tasks)
        .map(|index| {
            let n_scenarios = base + usize::from(index < remainder);
            let task = PricingTask {
                index,
                start_scenario: start,
                n_scenarios,
            };
            start += n_scenarios;
            task
        })
        .filter(|task| task.n_scenarios > 0)
        .collect()
}

/// Outcome of a pricing run
#[derive(Debug, Clone, PartialEq)]
pub struct PricingReport {
    /// Discounted expected payoff
    pub price: f64,
    /// Standard error of `price`
    pub standard_error: f64,
    pub scenarios: usize,
    /// Steps actually simulated (1 for path-independent contracts)
    pub steps: usize,
    /// Tasks actually scheduled
    pub tasks: usize,
    pub elapsed: Duration,
}

impl PricingReport {
    /// Half-width of the ~95% confidence interval
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.standard_error
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TaskSums {
    sum: f64,
    sum_sq: f64,
    scenarios: usize,
}

struct TaskContext<'a, C: ?Sized> {
    contract: &'a C,
    simulator: &'a PathSimulator<'a>,
    factory: RngFactory,
    maturity: f64,
    n_steps: usize,
    batch_paths: usize,
    draws_per_scenario: u64,
    abort: &'a AtomicBool,
}

impl<C: ContinuousTimeContract + ?Sized> TaskContext<'_, C> {
    /// Ok(None) when the task stopped because another task failed.
    fn run(&self, task: PricingTask) -> PricingResult<Option<TaskSums>> {
        let offset = task.start_scenario as u64 * self.draws_per_scenario;
        let mut rng = self.factory.substream(offset);
        let mut sums = TaskSums::default();
        let mut remaining = task.n_scenarios;

        while remaining > 0 {
            if self.abort.load(Ordering::Relaxed) {
                trace!(task = task.index, "task abandoned");
                return Ok(None);
            }
            let n_paths = remaining.min(self.batch_paths);
            let simulation = self.simulator.simulate(
                &mut rng,
                self.maturity,
                n_paths,
                self.n_steps,
                Measure::RiskNeutral,
            )?;
            let payoff = self.contract.payoff(&simulation)?;
            if payoff.len() != n_paths {
                return Err(PricingError::PayoffError {
                    contract: self.contract.name().to_string(),
                    reason: format!(
                        "returned {} payoffs for {} scenarios",
                        payoff.len(),
                        n_paths
                    ),
                });
            }
            sums.sum += payoff.sum();
            sums.sum_sq += payoff.iter().map(|p| p * p).sum::<f64>();
            sums.scenarios += n_paths;
            remaining -= n_paths;
        }
        Ok(Some(sums))
    }
}

/// Prices contracts by splitting scenarios across a bounded worker pool.
///
/// Results depend on the seed and the scenario count, never on the task
/// count or the concurrency limit.
///
/// # Example
///
/// ```rust
/// use parallel_mc::config::PricerConfig;
/// use parallel_mc::mc::contracts::VanillaOption;
/// use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
/// use parallel_mc::models::MultiAssetModel;
///
/// let model = MultiAssetModel::single_asset("Acme", 100.0, 0.0, 0.2, 0.05, 0.0).unwrap();
/// let call = VanillaOption::new("Acme", parallel_mc::mc::payoffs::OptionKind::Call, 100.0, 1.0).unwrap();
/// let pricer = ParallelMonteCarloPricer::new(PricerConfig::default().with_scenarios(20_000)).unwrap();
/// let price = pricer.price(&call, &model).unwrap();
/// assert!(price > 8.0 && price < 13.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelMonteCarloPricer {
    config: PricerConfig,
}

impl ParallelMonteCarloPricer {
    pub fn new(config: PricerConfig) -> PricingResult<Self> {
        config.validate()?;
        Ok(ParallelMonteCarloPricer { config })
    }

    pub fn config(&self) -> &PricerConfig {
        &self.config
    }

    /// Price with the configured scenario, step and task counts
    pub fn price<C>(&self, contract: &C, model: &MultiAssetModel) -> PricingResult<f64>
    where
        C: ContinuousTimeContract + ?Sized,
    {
        self.price_detailed(contract, model).map(|r| r.price)
    }

    /// Price with explicit scenario, step and task counts
    pub fn price_with<C>(
        &self,
        contract: &C,
        model: &MultiAssetModel,
        total_scenarios: usize,
        n_steps: usize,
        n_tasks: usize,
    ) -> PricingResult<f64>
    where
        C: ContinuousTimeContract + ?Sized,
    {
        self.price_detailed_with(contract, model, total_scenarios, n_steps, n_tasks)
            .map(|r| r.price)
    }

    pub fn price_detailed<C>(
        &self,
        contract: &C,
        model: &MultiAssetModel,
    ) -> PricingResult<PricingReport>
    where
        C: ContinuousTimeContract + ?Sized,
    {
        self.price_detailed_with(
            contract,
            model,
            self.config.scenarios,
            self.config.steps,
            self.config.tasks,
        )
    }

    pub fn price_detailed_with<C>(
        &self,
        contract: &C,
        model: &MultiAssetModel,
        total_scenarios: usize,
        n_steps: usize,
        n_tasks: usize,
    ) -> PricingResult<PricingReport>
    where
        C: ContinuousTimeContract + ?Sized,
    {
        let timer = Timer::new();
        validate_tasks(n_tasks)?;
        validate_scenarios(total_scenarios)?;
        validate_steps(n_steps)?;

        let maturity = contract.maturity();
        validate_finite("maturity", maturity)?;
        if maturity <= model.date() {
            return Err(PricingError::InvalidParameters {
                parameter: "maturity".to_string(),
                value: maturity,
                constraint: format!("must be after the model date {}", model.date()),
            });
        }

        let sub_model = model.restrict_to(contract.dependent_assets())?;
        let n_steps = if contract.is_path_dependent() { n_steps } else { 1 };
        let simulator =
            PathSimulator::new(&sub_model)?.with_max_batch_cells(self.config.max_batch_cells);
        let tasks = split_scenarios(total_scenarios, n_tasks);
        let workers = tasks.len().min(self.config.max_concurrency).max(1);

        debug!(
            contract = contract.name(),
            assets = sub_model.n_assets(),
            scenarios = total_scenarios,
            steps = n_steps,
            tasks = tasks.len(),
            workers,
            "pricing started"
        );

        let abort = AtomicBool::new(false);
        let context = TaskContext {
            contract,
            simulator: &simulator,
            factory: RngFactory::new(self.config.seed),
            maturity,
            n_steps,
            batch_paths: simulator.paths_per_batch(n_steps),
            draws_per_scenario: sub_model.random_draws_required(1, n_steps),
            abort: &abort,
        };

        let (tx, rx) = mpsc::channel();
        let joined = TaskExecutor::new(workers).scope(|exec| {
            for &task in &tasks {
                let tx = tx.clone();
                let context = &context;
                exec.submit(move || {
                    let result = match panic::catch_unwind(AssertUnwindSafe(|| context.run(task))) {
                        Ok(result) => result,
                        Err(payload) => {
                            // Stop the other tasks, then let the executor record the panic
                            context.abort.store(true, Ordering::Relaxed);
                            panic::resume_unwind(payload)
                        }
                    };
                    if result.is_err() {
                        context.abort.store(true, Ordering::Relaxed);
                    }
                    // The receiver outlives the scope.
                    let _ = tx.send((task.index, result));
                });
            }
            exec.join_all()
        });
        drop(tx);

        let mut results: Vec<(usize, PricingResult<Option<TaskSums>>)> = rx.into_iter().collect();
        results.sort_by_key(|(index, _)| *index);

        let mut total = TaskSums::default();
        let mut first_error = None;
        for (index, result) in results {
            match result {
                Ok(Some(sums)) => {
                    total.sum += sums.sum;
                    total.sum_sq += sums.sum_sq;
                    total.scenarios += sums.scenarios;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(task = index, error = %e, "pricing task failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        joined?;
        if total.scenarios != total_scenarios {
            return Err(PricingError::TaskFailed {
                reason: format!(
                    "priced {} of {} scenarios",
                    total.scenarios, total_scenarios
                ),
            });
        }

        let n = total_scenarios as f64;
        let discount = (-sub_model.risk_free_rate() * (maturity - sub_model.date())).exp();
        let mean = total.sum / n;
        let price = discount * mean;

        let mut variance = if total_scenarios > 1 {
            (total.sum_sq / n - mean * mean) * discount.powi(2) / (n - 1.0)
        } else {
            0.0
        };
        // Cancellation in sum_sq/n - mean² can leave a tiny negative.
        if variance < 0.0 {
            if variance > -1e-10 {
                variance = 0.0;
            } else {
                return Err(PricingError::NumericalInstability {
                    method: "Monte Carlo".to_string(),
                    reason: format!("Variance estimate became significantly negative: {}", variance),
                });
            }
        }

        if !price.is_finite() {
            return Err(PricingError::NumericalInstability {
                method: "Monte Carlo".to_string(),
                reason: format!("Price estimate is not finite: {}", price),
            });
        }
        if !variance.is_finite() {
            return Err(PricingError::NumericalInstability {
                method: "Monte Carlo".to_string(),
                reason: format!("Variance estimate is not finite: {}", variance),
            });
        }

        let report = PricingReport {
            price,
            standard_error: variance.sqrt(),
            scenarios: total_scenarios,
            steps: n_steps,
            tasks: tasks.len(),
            elapsed: timer.elapsed(),
        };
        debug!(
            contract = contract.name(),
            price = report.price,
            standard_error = report.standard_error,
            elapsed_ms = timer.elapsed_ms(),
            "pricing finished"
        );
        Ok(report)
    }
}

impl Default for ParallelMonteCarloPricer {
    fn default() -> Self {
        ParallelMonteCarloPricer {
            config: PricerConfig::default(),
        }
    }
}
