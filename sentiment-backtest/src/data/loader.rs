use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use common::{
    BacktestError, PriceBar, RawCandle, Result, SignalDirection, SignalEvent,
};

use crate::series::PriceSeries;

/// Epoch values at or above this are read as milliseconds
const MILLIS_CUTOFF: i64 = 100_000_000_000;

/// Load candles from CSV file
///
/// Expected columns: open_time, close_time, open, high, low, close, volume,
/// trades_count
pub fn load_candles_csv(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path).map_err(|e| BacktestError::DataLoad(e.to_string()))?;
    let reader = BufReader::new(file);
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();

    for (row, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| BacktestError::Csv(e.to_string()))?;

        if record.len() < 8 {
            return Err(BacktestError::Csv(format!(
                "row {}: expected 8 columns, got {}",
                row + 1,
                record.len()
            )));
        }

        let open_time = parse_timestamp(&record[0])?;
        let close_time = parse_timestamp(&record[1])?;
        let open = parse_number(&record[2], "open")?;
        let high = parse_number(&record[3], "high")?;
        let low = parse_number(&record[4], "low")?;
        let close = parse_number(&record[5], "close")?;
        let volume = parse_number(&record[6], "volume")?;
        let trades_count: u64 = record[7]
            .parse()
            .map_err(|_| BacktestError::Csv(format!("Invalid trades_count: {}", &record[7])))?;

        bars.push(PriceBar::new(
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
            trades_count,
        )?);
    }

    PriceSeries::new(bars)
}

/// Load candles from a JSON array of exchange candles
pub fn load_candles_json(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path).map_err(|e| BacktestError::DataLoad(e.to_string()))?;
    let reader = BufReader::new(file);
    let candles: Vec<RawCandle> = serde_json::from_reader(reader)?;
    PriceSeries::from_candles(candles)
}

/// Load signals from CSV file
///
/// Expected columns: date, direction, [credibility_flag]. The direction column
/// holds a label or a numeric sentiment polarity. Rows with fewer than two
/// columns or a blank direction are skipped.
pub fn load_signals_csv(path: &Path) -> Result<Vec<SignalEvent>> {
    let file = File::open(path).map_err(|e| BacktestError::DataLoad(e.to_string()))?;
    let reader = BufReader::new(file);
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut events = Vec::new();

    for result in csv_reader.records() {
        let record = result.map_err(|e| BacktestError::Csv(e.to_string()))?;

        if record.len() < 2 || record[1].is_empty() {
            continue;
        }

        let date = parse_timestamp(&record[0])?.date_naive();
        let direction = parse_direction(&record[1])?;
        let credibility_flag = match record.get(2) {
            Some(raw) if !raw.is_empty() => Some(parse_flag(raw)?),
            _ => None,
        };

        events.push(SignalEvent {
            date,
            direction,
            credibility_flag,
        });
    }

    Ok(events)
}

/// Load signals from a JSON array
pub fn load_signals_json(path: &Path) -> Result<Vec<SignalEvent>> {
    let file = File::open(path).map_err(|e| BacktestError::DataLoad(e.to_string()))?;
    let reader = BufReader::new(file);
    let events: Vec<SignalEvent> = serde_json::from_reader(reader)?;
    Ok(events)
}

fn parse_number(s: &str, field: &str) -> Result<f64> {
    s.parse()
        .map_err(|_| BacktestError::Csv(format!("Invalid {}: {}", field, s)))
}

/// Label (`bullish`) or polarity (`0.35`)
fn parse_direction(s: &str) -> Result<SignalDirection> {
    match s.parse::<f64>() {
        Ok(polarity) => Ok(SignalDirection::from_polarity(polarity)),
        Err(_) => s.parse(),
    }
}

fn parse_flag(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(BacktestError::Csv(format!("Invalid credibility_flag: {}", other))),
    }
}

/// Parse timestamp from various formats
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in &date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    // Epoch milliseconds (exchange klines) or seconds
    if let Ok(ts) = s.parse::<i64>() {
        let parsed = if ts.abs() >= MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(BacktestError::Csv(format!(
        "Unable to parse timestamp: {}",
        s
    )))
}
