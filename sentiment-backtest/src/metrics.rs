use chrono::NaiveDate;
use common::{PerformanceMetrics, TradeAction, TradeRecord};

/// Read-only fold over the ledger and equity curve
pub struct MetricsCalculator;

struct RoundTripStats {
    round_trips: u32,
    winning: u32,
    losing: u32,
    win_rate: f64,
}

impl MetricsCalculator {
    /// Calculate all performance metrics
    pub fn calculate(
        trades: &[TradeRecord],
        equity_curve: &[(NaiveDate, f64)],
        initial_balance: f64,
        final_value: f64,
    ) -> PerformanceMetrics {
        let total_return = final_value - initial_balance;
        let total_return_pct = if initial_balance > 0.0 {
            (total_return / initial_balance) * 100.0
        } else {
            0.0
        };

        let buy_count = Self::count(trades, TradeAction::Buy);
        let sell_count = Self::count(trades, TradeAction::Sell);
        let round_trip = Self::round_trip_stats(trades);

        PerformanceMetrics {
            total_return,
            total_return_pct,
            buy_count,
            sell_count,
            total_trades: trades.len() as u32,
            round_trips: round_trip.round_trips,
            winning_trades: round_trip.winning,
            losing_trades: round_trip.losing,
            win_rate: round_trip.win_rate,
            total_fees: trades.iter().map(|t| t.fee).sum(),
            max_drawdown_pct: Self::calculate_max_drawdown(equity_curve),
            exposure_pct: Self::calculate_exposure(trades, equity_curve),
        }
    }

    fn count(trades: &[TradeRecord], action: TradeAction) -> u32 {
        trades.iter().filter(|t| t.action == action).count() as u32
    }

    /// Pair each BUY with the SELL that follows it.
    ///
    /// Cash spent on the buy is `amount * price + fee`; cash received on the
    /// sell is `amount * price - fee`.
    fn round_trip_stats(trades: &[TradeRecord]) -> RoundTripStats {
        let mut round_trips = 0u32;
        let mut winning = 0u32;
        let mut losing = 0u32;
        let mut open_cost: Option<f64> = None;

        for trade in trades {
            match trade.action {
                TradeAction::Buy => {
                    open_cost = Some(trade.amount * trade.price + trade.fee);
                }
                TradeAction::Sell => {
                    if let Some(cost) = open_cost.take() {
                        let proceeds = trade.amount * trade.price - trade.fee;
                        round_trips += 1;
                        if proceeds > cost {
                            winning += 1;
                        } else if proceeds < cost {
                            losing += 1;
                        }
                    }
                }
            }
        }

        let win_rate = if round_trips > 0 {
            (winning as f64 / round_trips as f64) * 100.0
        } else {
            0.0
        };

        RoundTripStats {
            round_trips,
            winning,
            losing,
            win_rate,
        }
    }

    /// Largest peak-to-trough decline, as a negative percentage
    pub fn calculate_max_drawdown(equity_curve: &[(NaiveDate, f64)]) -> f64 {
        let mut peak = f64::MIN;
        let mut max_dd = 0.0_f64;

        for &(_, equity) in equity_curve {
            if equity > peak {
                peak = equity;
            }
            if peak > 0.0 {
                let dd = (equity - peak) / peak * 100.0;
                max_dd = max_dd.min(dd);
            }
        }

        max_dd
    }

    /// Share of bars ending in position, in percent
    fn calculate_exposure(trades: &[TradeRecord], equity_curve: &[(NaiveDate, f64)]) -> f64 {
        if equity_curve.is_empty() {
            return 0.0;
        }

        let mut held = 0usize;
        let mut ledger = trades.iter().peekable();
        let mut in_position = false;

        for (date, _) in equity_curve {
            while let Some(trade) = ledger.next_if(|t| t.date <= *date) {
                in_position = trade.action == TradeAction::Buy;
            }
            if in_position {
                held += 1;
            }
        }

        (held as f64 / equity_curve.len() as f64) * 100.0
    }
}
