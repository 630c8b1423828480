use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    /// Malformed or non-monotonic price data. Aborts the run.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid strategy parameters, raised at construction time only.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data loading error: {0}")]
    DataLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BacktestError>;
