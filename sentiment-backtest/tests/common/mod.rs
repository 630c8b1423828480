#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sentiment_backtest::{
    PriceBar, PriceSeries, SignalDirection, SignalEvent, StrategyConfig,
};

pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

/// Daily bar with a flat body at `close`
pub fn bar(offset: usize, close: f64) -> PriceBar {
    let open_time =
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset as i64);
    PriceBar::new(
        open_time,
        open_time + Duration::hours(24) - Duration::milliseconds(1),
        close,
        close,
        close,
        close,
        100.0,
        10,
    )
    .unwrap()
}

pub fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i, c))
            .collect(),
    )
    .unwrap()
}

pub fn bullish(offset: usize) -> SignalEvent {
    SignalEvent::new(day(offset), SignalDirection::Bullish)
}

pub fn bearish(offset: usize) -> SignalEvent {
    SignalEvent::new(day(offset), SignalDirection::Bearish)
}

pub fn config(window: usize, initial_balance: f64, fee_rate: f64) -> StrategyConfig {
    StrategyConfig::new(window, initial_balance, fee_rate).unwrap()
}
