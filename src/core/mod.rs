//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod cost;
pub mod currency;
pub mod error;
pub mod log;
pub mod report;
pub mod settings;
pub mod store;

// Re-export main types for cleaner imports
pub use cost::{Category, Currency, NewCost, StoredCost};
pub use currency::{RateProvider, RateResolution, RateTable};
pub use error::CostError;
pub use store::CostStore;
