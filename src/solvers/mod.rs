// src/solvers/mod.rs
pub mod log_euler;

pub use log_euler::{cholesky, Measure, PathSimulator, DEFAULT_MAX_BATCH_CELLS};
