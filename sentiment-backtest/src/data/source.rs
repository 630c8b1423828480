//! Capability interfaces for the price and sentiment collaborators.
//!
//! The engine only ever sees a [`PriceSeries`] and a list of [`SignalEvent`];
//! where they come from (exchange, database, files, fixtures) sits behind
//! these traits.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use common::{BacktestError, Result, SignalEvent};

use crate::data::{load_candles_csv, load_signals};
use crate::series::PriceSeries;

pub trait PriceDataSource {
    /// Daily bars for `symbol` within `start..=end`
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

pub trait SignalSource {
    /// Classified signals dated within `start..=end`
    fn signals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SignalEvent>>;
}

/// Directory holding one `<SYMBOL>.csv` per instrument
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PriceDataSource for CsvPriceSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let path = self.dir.join(format!("{}.csv", symbol));
        if !path.exists() {
            return Err(BacktestError::DataLoad(format!(
                "no price file for {} at {}",
                symbol,
                path.display()
            )));
        }
        Ok(load_candles_csv(&path)?.between(start, end))
    }
}

/// Fixture source keyed by symbol
#[derive(Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.series.insert(symbol.to_string(), series);
        self
    }
}

impl PriceDataSource for InMemoryPriceSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        self.series
            .get(symbol)
            .map(|s| s.between(start, end))
            .ok_or_else(|| BacktestError::DataLoad(format!("unknown symbol: {}", symbol)))
    }
}

/// Signals from a CSV or JSON file
pub struct FileSignalSource {
    path: PathBuf,
}

impl FileSignalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SignalSource for FileSignalSource {
    fn signals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SignalEvent>> {
        Ok(in_range(load_signals(&self.path)?, start, end))
    }
}

/// Fixture source over a fixed list of events
#[derive(Default)]
pub struct InMemorySignalSource {
    events: Vec<SignalEvent>,
}

impl InMemorySignalSource {
    pub fn new(events: Vec<SignalEvent>) -> Self {
        Self { events }
    }
}

impl SignalSource for InMemorySignalSource {
    fn signals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SignalEvent>> {
        Ok(in_range(self.events.clone(), start, end))
    }
}

fn in_range(events: Vec<SignalEvent>, start: NaiveDate, end: NaiveDate) -> Vec<SignalEvent> {
    events
        .into_iter()
        .filter(|e| e.date >= start && e.date <= end)
        .collect()
}
