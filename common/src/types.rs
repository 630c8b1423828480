use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};

/// Polarity above which a classified article counts as bullish
pub const BULLISH_POLARITY_THRESHOLD: f64 = 0.1;
/// Polarity below which a classified article counts as bearish
pub const BEARISH_POLARITY_THRESHOLD: f64 = -0.1;

/// Candle as delivered by the exchange, timestamps in epoch milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades_count: u64,
}

/// OHLCV bar for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades_count: u64,
}

impl PriceBar {
    /// Build a bar keyed by the UTC day of `open_time`, checking its bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        open_time: DateTime<Utc>,
        close_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        trades_count: u64,
    ) -> Result<Self> {
        let bar = Self {
            date: open_time.date_naive(),
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
            trades_count,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Check interval and OHLC bounds.
    pub fn validate(&self) -> Result<()> {
        if self.close_time <= self.open_time {
            return Err(BacktestError::DataIntegrity(format!(
                "{}: close_time {} is not after open_time {}",
                self.date, self.close_time, self.open_time
            )));
        }

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(BacktestError::DataIntegrity(format!(
                "{}: prices must be positive, got o={} h={} l={} c={}",
                self.date, self.open, self.high, self.low, self.close
            )));
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || self.high < body_high {
            return Err(BacktestError::DataIntegrity(format!(
                "{}: OHLC bounds violated (o={} h={} l={} c={})",
                self.date, self.open, self.high, self.low, self.close
            )));
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BacktestError::DataIntegrity(format!(
                "{}: volume must be non-negative, got {}",
                self.date, self.volume
            )));
        }

        Ok(())
    }
}

impl TryFrom<RawCandle> for PriceBar {
    type Error = BacktestError;

    fn try_from(raw: RawCandle) -> Result<Self> {
        let open_time = millis_to_datetime(raw.open_time)?;
        let close_time = millis_to_datetime(raw.close_time)?;
        PriceBar::new(
            open_time,
            close_time,
            raw.open,
            raw.high,
            raw.low,
            raw.close,
            raw.volume,
            raw.trades_count,
        )
    }
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| BacktestError::DataIntegrity(format!("timestamp out of range: {}ms", ms)))
}

/// Direction label produced by the sentiment classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    #[serde(alias = "Bullish", alias = "BULLISH")]
    Bullish,
    #[serde(alias = "Bearish", alias = "BEARISH")]
    Bearish,
    #[serde(alias = "Neutral", alias = "NEUTRAL")]
    Neutral,
}

impl SignalDirection {
    /// Map a sentiment polarity in [-1, 1] onto a direction.
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > BULLISH_POLARITY_THRESHOLD {
            SignalDirection::Bullish
        } else if polarity < BEARISH_POLARITY_THRESHOLD {
            SignalDirection::Bearish
        } else {
            SignalDirection::Neutral
        }
    }
}

impl FromStr for SignalDirection {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bullish" => Ok(SignalDirection::Bullish),
            "bearish" => Ok(SignalDirection::Bearish),
            "neutral" => Ok(SignalDirection::Neutral),
            other => Err(BacktestError::DataLoad(format!(
                "Unknown signal direction: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalDirection::Bullish => "Bullish",
            SignalDirection::Bearish => "Bearish",
            SignalDirection::Neutral => "Neutral",
        };
        f.pad(label)
    }
}

/// One dated directional observation. Several may share a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub direction: SignalDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credibility_flag: Option<bool>,
}

impl SignalEvent {
    pub fn new(date: NaiveDate, direction: SignalDirection) -> Self {
        Self {
            date,
            direction,
            credibility_flag: None,
        }
    }

    pub fn with_credibility_flag(mut self, flag: bool) -> Self {
        self.credibility_flag = Some(flag);
        self
    }
}

/// Price bar annotated with the day's signal flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedBar {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub bullish_signal: bool,
    pub bearish_signal: bool,
}

impl AlignedBar {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Fill side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.pad("BUY"),
            TradeAction::Sell => f.pad("SELL"),
        }
    }
}

/// Ledger entry appended on every fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    /// Units of the asset transacted
    pub amount: f64,
    /// Cash cost of the fee charged on this fill
    pub fee: f64,
}

/// Which side of the all-in/all-out policy the portfolio is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InCash,
    InPosition,
}

/// Cash and asset holdings. At most one of the two is strictly positive.
///
/// The phase is recorded on each fill rather than inferred from the
/// balances, so a fill that rounds to zero units still flips it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash_balance: f64,
    pub position_size: f64,
    pub phase: Phase,
}

impl PortfolioState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash_balance: initial_balance,
            position_size: 0.0,
            phase: Phase::InCash,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Mark-to-market value at `price`
    pub fn value_at(&self, price: f64) -> f64 {
        self.cash_balance + self.position_size * price
    }
}

/// Summary statistics folded from the ledger and equity curve
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Returns
    pub total_return: f64,
    pub total_return_pct: f64,
    // Ledger counts
    pub buy_count: u32,
    pub sell_count: u32,
    pub total_trades: u32,
    // Round trips (BUY followed by SELL)
    pub round_trips: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: f64,
    pub total_fees: f64,
    // Risk
    pub max_drawdown_pct: f64,
    pub exposure_pct: f64,
}

/// Outcome of one backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub final_state: PortfolioState,
    pub final_value: f64,
    pub initial_balance: f64,
    pub equity_curve: Vec<(NaiveDate, f64)>,
    pub metrics: PerformanceMetrics,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
