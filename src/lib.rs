//! # parallel-mc: Reproducible Multi-Asset Monte Carlo Pricing
//!
//! A Rust library for pricing path-dependent and multi-asset contracts by
//! simulating correlated lognormal price paths across a bounded pool of
//! worker threads.
//!
//! ## Key Features
//!
//! - **Correlated Paths**: log-Euler simulation driven by the Cholesky factor
//!   of the asset covariance matrix
//! - **Reproducible Parallelism**: the price depends on the seed and the
//!   scenario count, not on how scenarios are split across tasks
//! - **Bounded Memory**: large scenario counts are simulated in sub-batches
//! - **Open Contract Set**: anything implementing [`ContinuousTimeContract`]
//!   can be priced; vanilla, barrier, Asian and exchange options are included
//! - **Fail Fast**: configuration and model errors surface before any work
//!   is scheduled
//!
//! ## Quick Start
//!
//! ```rust
//! use parallel_mc::config::PricerConfig;
//! use parallel_mc::mc::contracts::BarrierOption;
//! use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
//! use parallel_mc::models::MultiAssetModel;
//!
//! // Acme: spot 100, drift 5%, volatility 20%, rate 5%, valuation date 0
//! let model = MultiAssetModel::single_asset("Acme", 100.0, 0.05, 0.2, 0.05, 0.0)
//!     .expect("Valid model");
//! let option = BarrierOption::up_and_out(100.0, 130.0, 1.0).expect("Valid contract");
//!
//! let config = PricerConfig::default()
//!     .with_scenarios(20_000)
//!     .with_steps(52)
//!     .with_tasks(4);
//! let pricer = ParallelMonteCarloPricer::new(config).expect("Valid configuration");
//!
//! let report = pricer.price_detailed(&option, &model).expect("Priced");
//! println!("Up-and-out: {:.4} ± {:.4}", report.price, report.confidence_95());
//! ```
//!
//! ## Mathematical Foundation
//!
//! Each asset follows a geometric Brownian motion whose Brownian drivers are
//! correlated through the model covariance Σ. Prices are simulated under the
//! risk-neutral measure and the discounted mean payoff estimates the price:
//! ```text
//! V = e^(-r(T - t₀)) * E^Q[payoff(S)]
//! ```

// Module declarations
pub mod analytics;
pub mod config;
pub mod error;
pub mod executor;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod rng;
pub mod solvers;

// Re-export commonly used types for convenience
pub use config::PricerConfig;
pub use error::{PricingError, PricingResult};
pub use executor::TaskExecutor;
pub use mc::{ContinuousTimeContract, MarketSimulation, ParallelMonteCarloPricer, PricingReport};
pub use models::MultiAssetModel;
pub use solvers::PathSimulator;
