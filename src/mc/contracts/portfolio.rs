// src/mc/contracts/portfolio.rs
use crate::error::{validation::validate_finite, PricingError, PricingResult};
use crate::mc::mc_engine::ParallelMonteCarloPricer;
use crate::mc::payoffs::ContinuousTimeContract;
use crate::models::multi_asset::MultiAssetModel;
use tracing::trace;

/// Weighted collection of contracts, valued as Σ qᵢ · priceᵢ.
///
/// Each position is priced by its own pricer call, so every contract sees
/// the same random sequence and hedged positions largely cancel.
#[derive(Default)]
pub struct Portfolio {
    positions: Vec<(f64, Box<dyn ContinuousTimeContract>)>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a position and return its index
    pub fn add<C>(&mut self, quantity: f64, contract: C) -> PricingResult<usize>
    where
        C: ContinuousTimeContract + 'static,
    {
        validate_finite("quantity", quantity)?;
        self.positions.push((quantity, Box::new(contract)));
        Ok(self.positions.len() - 1)
    }

    pub fn set_quantity(&mut self, index: usize, quantity: f64) -> PricingResult<()> {
        validate_finite("quantity", quantity)?;
        let n = self.positions.len();
        let position = self
            .positions
            .get_mut(index)
            .ok_or_else(|| PricingError::InvalidConfiguration {
                field: "position".to_string(),
                reason: format!("index {} out of range for {} positions", index, n),
            })?;
        position.0 = quantity;
        Ok(())
    }

    pub fn quantity(&self, index: usize) -> Option<f64> {
        self.positions.get(index).map(|(q, _)| *q)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn price(
        &self,
        pricer: &ParallelMonteCarloPricer,
        model: &MultiAssetModel,
    ) -> PricingResult<f64> {
        let mut total = 0.0;
        for (index, (quantity, contract)) in self.positions.iter().enumerate() {
            if *quantity == 0.0 {
                continue;
            }
            let price = pricer.price(contract.as_ref(), model)?;
            trace!(position = index, contract = contract.name(), quantity, price);
            total += quantity * price;
        }
        Ok(total)
    }
}

impl std::fmt::Debug for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.positions
                    .iter()
                    .map(|(q, c)| (*q, c.name().to_string())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricerConfig;
    use crate::mc::contracts::VanillaOption;

    #[test]
    fn test_positions_and_quantities() {
        let mut book = Portfolio::new();
        assert!(book.is_empty());
        let call = book
            .add(100.0, VanillaOption::call(100.0, 1.0).unwrap())
            .unwrap();
        let put = book
            .add(-100.0, VanillaOption::put(100.0, 1.0).unwrap())
            .unwrap();
        assert_eq!((call, put), (0, 1));
        assert_eq!(book.len(), 2);

        book.set_quantity(put, -50.0).unwrap();
        assert_eq!(book.quantity(put), Some(-50.0));
        assert!(book.set_quantity(7, 1.0).is_err());
        assert!(book.set_quantity(0, f64::NAN).is_err());
    }

    #[test]
    fn test_non_finite_quantity_rejected_on_add() {
        let mut book = Portfolio::new();
        let call = VanillaOption::call(100.0, 1.0).unwrap();
        assert!(book.add(f64::NAN, call.clone()).is_err());
        assert!(book.add(f64::INFINITY, call).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn test_empty_portfolio_is_worth_nothing() {
        let model = MultiAssetModel::create_test_model();
        let pricer = ParallelMonteCarloPricer::new(PricerConfig::default()).unwrap();
        assert_eq!(Portfolio::new().price(&pricer, &model).unwrap(), 0.0);
    }
}
