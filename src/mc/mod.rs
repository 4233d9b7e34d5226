// src/mc/mod.rs
pub mod contracts;
pub mod market_simulation;
pub mod mc_engine;
pub mod payoffs;

pub use market_simulation::MarketSimulation;
pub use mc_engine::{ParallelMonteCarloPricer, PricingReport};
pub use payoffs::{ContinuousTimeContract, OptionKind};
