// src/models/mod.rs
pub mod black_scholes;
pub mod multi_asset;

pub use black_scholes::BlackScholesModel;
pub use multi_asset::{MultiAssetModel, DEFAULT_ASSET};
