// src/error.rs
use thiserror::Error;

/// Error types for the parallel-mc library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Vector and matrix dimensions of a model do not agree
    #[error("Invalid model: {reason}")]
    InvalidModel { reason: String },

    /// A model was asked about an asset it does not contain
    #[error("Unknown asset '{asset}' in model")]
    InvalidAsset { asset: String },

    /// A simulation does not contain an asset a contract depends on
    #[error("Asset '{asset}' missing from market simulation ({context})")]
    MissingAsset { asset: String, context: String },

    /// Cholesky factorisation of the covariance matrix failed
    #[error("Covariance matrix of dimension {dimension} is not positive definite")]
    NotPositiveDefinite { dimension: usize },

    /// Invalid pricer or simulation configuration
    #[error("Invalid configuration '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Payoff evaluation produced an unusable result
    #[error("Payoff error in {contract}: {reason}")]
    PayoffError { contract: String, reason: String },

    /// Non-finite aggregate results
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },

    /// A worker task panicked or never reported a result
    #[error("Pricing task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Result type alias for parallel-mc operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Validation utilities
pub mod validation {
    use super::{PricingError, PricingResult};

    /// Upper bound on scenarios accepted by a single pricing call
    pub const MAX_SCENARIOS: usize = 1_000_000_000;

    /// Upper bound on time steps per path
    pub const MAX_STEPS: usize = 100_000;

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> PricingResult<()> {
        if value.is_nan() || value <= 0.0 {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> PricingResult<()> {
        if value.is_nan() || value < 0.0 {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> PricingResult<()> {
        if !value.is_finite() {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate scenario count
    pub fn validate_scenarios(scenarios: usize) -> PricingResult<()> {
        if scenarios == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "scenarios".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if scenarios > MAX_SCENARIOS {
            Err(PricingError::InvalidConfiguration {
                field: "scenarios".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> PricingResult<()> {
        if steps == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > MAX_STEPS {
            Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate task count
    pub fn validate_tasks(tasks: usize) -> PricingResult<()> {
        if tasks == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "tasks".to_string(),
                reason: "at least one task is required".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
