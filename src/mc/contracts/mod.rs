// src/mc/contracts/mod.rs
pub mod asian;
pub mod barrier;
pub mod exchange;
pub mod portfolio;
pub mod vanilla;

pub use asian::AsianOption;
pub use barrier::{BarrierDirection, BarrierOption, KnockType};
pub use exchange::ExchangeOption;
pub use portfolio::Portfolio;
pub use vanilla::VanillaOption;
