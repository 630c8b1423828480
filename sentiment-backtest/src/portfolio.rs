use chrono::NaiveDate;
use common::{Phase, PortfolioState, TradeAction, TradeRecord};

/// All-in/all-out portfolio with an append-only trade ledger.
///
/// Every buy converts the entire cash balance, every sell the entire position,
/// so at most one of cash and position is positive at any time.
#[derive(Debug)]
pub struct Portfolio {
    initial_balance: f64,
    fee_rate: f64,
    state: PortfolioState,
    trades: Vec<TradeRecord>,
}

impl Portfolio {
    pub fn new(initial_balance: f64, fee_rate: f64) -> Self {
        Self {
            initial_balance,
            fee_rate,
            state: PortfolioState::new(initial_balance),
            trades: Vec::new(),
        }
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn state(&self) -> PortfolioState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn cash(&self) -> f64 {
        self.state.cash_balance
    }

    pub fn position_size(&self) -> f64 {
        self.state.position_size
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    /// Current equity at `price`
    pub fn equity(&self, price: f64) -> f64 {
        self.state.value_at(price)
    }

    /// Spend the whole cash balance at `price`, fee taken from the notional.
    ///
    /// Returns `None` when already in position.
    pub fn buy_all(&mut self, date: NaiveDate, price: f64) -> Option<&TradeRecord> {
        if self.phase() != Phase::InCash {
            return None;
        }

        let cash = self.state.cash_balance;
        let fee = cash * self.fee_rate;
        let amount = (cash * (1.0 - self.fee_rate)) / price;

        self.state.position_size = amount;
        self.state.cash_balance = 0.0;
        self.state.phase = Phase::InPosition;

        self.trades.push(TradeRecord {
            date,
            action: TradeAction::Buy,
            price,
            amount,
            fee,
        });
        self.trades.last()
    }

    /// Liquidate the whole position at `price`, fee taken from the proceeds.
    ///
    /// Returns `None` when holding no position.
    pub fn sell_all(&mut self, date: NaiveDate, price: f64) -> Option<&TradeRecord> {
        if self.phase() != Phase::InPosition {
            return None;
        }

        let amount = self.state.position_size;
        let gross = amount * price;
        let fee = gross * self.fee_rate;

        self.state.cash_balance = gross * (1.0 - self.fee_rate);
        self.state.position_size = 0.0;
        self.state.phase = Phase::InCash;

        self.trades.push(TradeRecord {
            date,
            action: TradeAction::Sell,
            price,
            amount,
            fee,
        });
        self.trades.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_portfolio_new() {
        let portfolio = Portfolio::new(10_000.0, 0.001);
        assert_eq!(portfolio.cash(), 10_000.0);
        assert_eq!(portfolio.position_size(), 0.0);
        assert_eq!(portfolio.phase(), Phase::InCash);
        assert_eq!(portfolio.equity(123.0), 10_000.0);
    }

    #[test]
    fn test_buy_deducts_fee_from_notional() {
        let mut portfolio = Portfolio::new(1000.0, 0.01);
        let trade = portfolio.buy_all(day(1), 100.0).unwrap().clone();

        assert_relative_eq!(trade.amount, 9.9, max_relative = 1e-12);
        assert_relative_eq!(trade.fee, 10.0, max_relative = 1e-12);
        assert_eq!(trade.action, TradeAction::Buy);
        assert_eq!(portfolio.cash(), 0.0);
        assert_eq!(portfolio.phase(), Phase::InPosition);
    }

    #[test]
    fn test_sell_deducts_fee_from_proceeds() {
        let mut portfolio = Portfolio::new(1000.0, 0.01);
        portfolio.buy_all(day(1), 100.0);
        let trade = portfolio.sell_all(day(2), 110.0).unwrap().clone();

        // 9.9 units * 110 = 1089, minus 1%
        assert_relative_eq!(trade.amount, 9.9, max_relative = 1e-12);
        assert_relative_eq!(trade.fee, 10.89, max_relative = 1e-9);
        assert_relative_eq!(portfolio.cash(), 1078.11, max_relative = 1e-9);
        assert_eq!(portfolio.position_size(), 0.0);
    }

    #[test]
    fn test_phase_gates_transitions() {
        let mut portfolio = Portfolio::new(1000.0, 0.0);
        assert!(portfolio.sell_all(day(1), 100.0).is_none());

        portfolio.buy_all(day(1), 100.0);
        assert!(portfolio.buy_all(day(2), 100.0).is_none());
        assert_eq!(portfolio.trades().len(), 1);
    }

    #[test]
    fn test_buy_that_rounds_to_zero_units_still_holds() {
        // 1e-310 * 0.5 / 1e20 underflows to 0.0 units
        let mut portfolio = Portfolio::new(1e-310, 0.5);
        let trade = portfolio.buy_all(day(1), 1e20).unwrap().clone();
        assert_eq!(trade.amount, 0.0);
        assert_eq!(portfolio.phase(), Phase::InPosition);

        assert!(portfolio.buy_all(day(2), 1e20).is_none());
        assert!(portfolio.sell_all(day(2), 1e20).is_some());
        assert_eq!(portfolio.phase(), Phase::InCash);
        assert_eq!(portfolio.trades().len(), 2);
    }

    #[test]
    fn test_round_trip_without_fee_is_lossless() {
        let mut portfolio = Portfolio::new(1000.0, 0.0);
        portfolio.buy_all(day(1), 37.0);
        portfolio.sell_all(day(2), 37.0);
        assert_relative_eq!(portfolio.cash(), 1000.0, max_relative = 1e-12);
    }
}
