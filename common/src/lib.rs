pub mod config;
pub mod error;
pub mod types;

pub use config::StrategyConfig;
pub use error::{BacktestError, Result};
pub use types::*;
