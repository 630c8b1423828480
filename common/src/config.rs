use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};

pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 10;
pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;
pub const DEFAULT_FEE_RATE: f64 = 0.001;

/// Immutable strategy parameters.
///
/// Fields are private so every instance has passed validation: the only ways
/// in are [`StrategyConfig::new`], the `with_*` builders and deserialization,
/// all of which run the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StrategyConfigFile")]
pub struct StrategyConfig {
    moving_average_window: usize,
    initial_balance: f64,
    fee_rate: f64,
}

/// On-disk shape of [`StrategyConfig`]; missing fields take the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct StrategyConfigFile {
    moving_average_window: usize,
    initial_balance: f64,
    fee_rate: f64,
}

impl Default for StrategyConfigFile {
    fn default() -> Self {
        Self {
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

impl TryFrom<StrategyConfigFile> for StrategyConfig {
    type Error = BacktestError;

    fn try_from(file: StrategyConfigFile) -> Result<Self> {
        Self::new(file.moving_average_window, file.initial_balance, file.fee_rate)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

impl StrategyConfig {
    pub fn new(moving_average_window: usize, initial_balance: f64, fee_rate: f64) -> Result<Self> {
        validate_initial_balance(initial_balance)?;
        validate_fee_rate(fee_rate)?;

        Ok(Self {
            moving_average_window,
            initial_balance,
            fee_rate,
        })
    }

    /// Load from a JSON file such as `{"moving_average_window": 5, "fee_rate": 0.0}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| BacktestError::DataLoad(e.to_string()))?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn moving_average_window(&self) -> usize {
        self.moving_average_window
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    /// Any window is valid; zero disables the moving-average gate.
    pub fn with_window(mut self, window: usize) -> Self {
        self.moving_average_window = window;
        self
    }

    pub fn with_initial_balance(mut self, balance: f64) -> Result<Self> {
        validate_initial_balance(balance)?;
        self.initial_balance = balance;
        Ok(self)
    }

    pub fn with_fee_rate(mut self, fee_rate: f64) -> Result<Self> {
        validate_fee_rate(fee_rate)?;
        self.fee_rate = fee_rate;
        Ok(self)
    }
}

fn validate_fee_rate(fee_rate: f64) -> Result<()> {
    if !fee_rate.is_finite() || !(0.0..1.0).contains(&fee_rate) {
        return Err(BacktestError::Configuration(format!(
            "fee_rate must be in [0, 1), got {}",
            fee_rate
        )));
    }
    Ok(())
}

fn validate_initial_balance(balance: f64) -> Result<()> {
    if !balance.is_finite() || balance <= 0.0 {
        return Err(BacktestError::Configuration(format!(
            "initial_balance must be a positive number, got {}",
            balance
        )));
    }
    Ok(())
}
