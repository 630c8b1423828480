pub mod loader;
pub mod source;
pub mod synthetic;

pub use loader::{load_candles_csv, load_candles_json, load_signals_csv, load_signals_json};
pub use source::{
    CsvPriceSource, FileSignalSource, InMemoryPriceSource, InMemorySignalSource, PriceDataSource,
    SignalSource,
};
pub use synthetic::{
    generate_synthetic_candles, generate_synthetic_signals, synthetic_end_date,
    synthetic_start_date,
};

use std::path::Path;

use chrono::NaiveDate;
use common::{BacktestError, Result, SignalEvent};

use crate::series::PriceSeries;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load candles from file, detecting format from extension
pub fn load_candles(path: &Path) -> Result<PriceSeries> {
    match extension(path).as_str() {
        "csv" => load_candles_csv(path),
        "json" => load_candles_json(path),
        ext => Err(BacktestError::DataLoad(format!(
            "Unsupported file format: {}",
            ext
        ))),
    }
}

/// Load signals from file, detecting format from extension
pub fn load_signals(path: &Path) -> Result<Vec<SignalEvent>> {
    match extension(path).as_str() {
        "csv" => load_signals_csv(path),
        "json" => load_signals_json(path),
        ext => Err(BacktestError::DataLoad(format!(
            "Unsupported file format: {}",
            ext
        ))),
    }
}

/// Load `symbol` between `start` and `end` inclusive.
///
/// A directory is read through [`CsvPriceSource`] (`<dir>/<SYMBOL>.csv`);
/// a single file is loaded by extension and `symbol` is not consulted.
pub fn load_prices(
    path: &Path,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries> {
    if path.is_dir() {
        CsvPriceSource::new(path).fetch(symbol, start, end)
    } else {
        Ok(load_candles(path)?.between(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CANDLES: &str = "open_time,close_time,open,high,low,close,volume,trades_count\n\
        2024-01-01,2024-01-01 23:59:59,100,110,90,105,50000,10\n\
        2024-01-02,2024-01-02 23:59:59,105,115,100,110,60000,12\n\
        2024-01-03,2024-01-03 23:59:59,110,120,105,115,55000,11\n";

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_load_prices_picks_symbol_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ETHUSDT.csv"), CANDLES).unwrap();

        let series = load_prices(dir.path(), "ETHUSDT", date(1), date(2)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 110.0);

        assert!(matches!(
            load_prices(dir.path(), "BTCUSDT", date(1), date(31)),
            Err(BacktestError::DataLoad(_))
        ));
    }

    #[test]
    fn test_load_prices_from_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, CANDLES).unwrap();

        let series = load_prices(&path, "ignored", date(2), NaiveDate::MAX).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().date, date(2));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.txt");
        fs::write(&path, CANDLES).unwrap();
        assert!(matches!(
            load_candles(&path),
            Err(BacktestError::DataLoad(_))
        ));
    }
}
