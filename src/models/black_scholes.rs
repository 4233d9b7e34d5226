// src/models/black_scholes.rs
use crate::analytics::bs_analytic;
use crate::error::{validation::*, PricingResult};

/// One-dimensional lognormal model described by scalars.
///
/// ```text
/// dS_t = μ S_t dt + σ S_t dW_t
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesModel {
    pub stock_price: f64,
    pub drift: f64,
    pub volatility: f64,
    pub risk_free_rate: f64,
    pub date: f64,
}

impl BlackScholesModel {
    pub fn new(
        stock_price: f64,
        drift: f64,
        volatility: f64,
        risk_free_rate: f64,
        date: f64,
    ) -> PricingResult<Self> {
        let model = BlackScholesModel {
            stock_price,
            drift,
            volatility,
            risk_free_rate,
            date,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> PricingResult<()> {
        validate_positive("stock_price", self.stock_price)?;
        validate_finite("stock_price", self.stock_price)?;
        validate_finite("drift", self.drift)?;
        validate_non_negative("volatility", self.volatility)?;
        validate_finite("volatility", self.volatility)?;
        validate_finite("risk_free_rate", self.risk_free_rate)?;
        validate_finite("date", self.date)?;
        Ok(())
    }

    /// Closed-form price of a European call maturing at `maturity`
    pub fn call_price(&self, strike: f64, maturity: f64) -> f64 {
        bs_analytic::bs_call_price(
            self.stock_price,
            strike,
            self.risk_free_rate,
            self.volatility,
            maturity - self.date,
        )
    }

    /// Closed-form price of a European put maturing at `maturity`
    pub fn put_price(&self, strike: f64, maturity: f64) -> f64 {
        bs_analytic::bs_put_price(
            self.stock_price,
            strike,
            self.risk_free_rate,
            self.volatility,
            maturity - self.date,
        )
    }
}

impl Default for BlackScholesModel {
    fn default() -> Self {
        BlackScholesModel {
            stock_price: 100.0,
            drift: 0.0,
            volatility: 0.1,
            risk_free_rate: 0.05,
            date: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_call_price_with_offset_date() {
        let model = BlackScholesModel {
            date: 1.0,
            volatility: 0.1,
            risk_free_rate: 0.05,
            stock_price: 100.0,
            drift: 0.1,
        };
        assert_abs_diff_eq!(model.call_price(105.0, 2.0), 4.046, epsilon = 0.01);
    }

    #[test]
    fn test_rejects_negative_volatility() {
        assert!(BlackScholesModel::new(100.0, 0.0, -0.2, 0.05, 0.0).is_err());
        assert!(BlackScholesModel::new(-1.0, 0.0, 0.2, 0.05, 0.0).is_err());
    }
}
