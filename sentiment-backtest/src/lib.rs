pub mod data;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod portfolio;
pub mod series;
pub mod signals;
pub mod strategy;

pub use data::{
    generate_synthetic_candles, generate_synthetic_signals, load_candles, load_prices,
    load_signals, CsvPriceSource, FileSignalSource, PriceDataSource, SignalSource,
};
pub use engine::BacktestEngine;
pub use metrics::MetricsCalculator;
pub use portfolio::Portfolio;
pub use series::PriceSeries;
pub use signals::{AlignedSeries, AlignmentStats, SignalAligner};
pub use strategy::{Decision, TradingStrategy};

// Re-export common types
pub use common::{
    AlignedBar, BacktestError, BacktestResult, PerformanceMetrics, Phase, PortfolioState,
    PriceBar, RawCandle, Result, SignalDirection, SignalEvent, StrategyConfig, TradeAction,
    TradeRecord,
};
