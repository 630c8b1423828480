use common::{AlignedBar, Phase};

use crate::indicators::trailing_sma;

/// Outcome of evaluating the strategy on one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

/// Sentiment-gated trend strategy.
///
/// Entry needs a bullish signal and a close above the trailing moving average
/// of the previous `moving_average_window` closes. Exit needs only a bearish
/// signal. The predicates read nothing after index `i`.
#[derive(Debug, Clone, Copy)]
pub struct TradingStrategy {
    moving_average_window: usize,
}

impl TradingStrategy {
    pub fn new(moving_average_window: usize) -> Self {
        Self {
            moving_average_window,
        }
    }

    pub fn moving_average_window(&self) -> usize {
        self.moving_average_window
    }

    /// Callers must keep `i` within `series`.
    pub fn should_buy(&self, series: &[AlignedBar], i: usize) -> bool {
        if i < self.moving_average_window {
            return false;
        }

        let bar = &series[i];
        if !bar.bullish_signal {
            return false;
        }

        // A zero window has no history to compare against.
        match trailing_sma(series, i, self.moving_average_window) {
            Some(moving_average) => bar.close() > moving_average,
            None => self.moving_average_window == 0,
        }
    }

    /// Callers must keep `i` within `series`.
    pub fn should_sell(&self, series: &[AlignedBar], i: usize) -> bool {
        series[i].bearish_signal
    }

    /// Consult the predicate matching the current phase only.
    pub fn decide(&self, series: &[AlignedBar], i: usize, phase: Phase) -> Decision {
        match phase {
            Phase::InCash if self.should_buy(series, i) => Decision::Buy,
            Phase::InPosition if self.should_sell(series, i) => Decision::Sell,
            _ => Decision::Hold,
        }
    }
}

impl Default for TradingStrategy {
    fn default() -> Self {
        Self::new(common::config::DEFAULT_MOVING_AVERAGE_WINDOW)
    }
}
