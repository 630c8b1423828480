use chrono::NaiveDate;
use common::{
    AlignedBar, BacktestError, BacktestResult, PortfolioState, Result, SignalEvent,
    StrategyConfig,
};
use tracing::{debug, info};

use crate::metrics::MetricsCalculator;
use crate::portfolio::Portfolio;
use crate::series::PriceSeries;
use crate::signals::SignalAligner;
use crate::strategy::{Decision, TradingStrategy};

/// Sequential replay of aligned bars through the strategy.
///
/// Each call to [`BacktestEngine::run`] owns a fresh portfolio and ledger, so
/// one engine can serve any number of independent runs.
pub struct BacktestEngine {
    config: StrategyConfig,
    strategy: TradingStrategy,
}

impl BacktestEngine {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            strategy: TradingStrategy::new(config.moving_average_window()),
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Align `events` onto `series` and run.
    pub fn run_with_signals(
        &self,
        series: &PriceSeries,
        events: &[SignalEvent],
    ) -> Result<BacktestResult> {
        let aligned = SignalAligner::align(series, events);
        self.run(&aligned.bars)
    }

    /// Run backtest on aligned bar data
    pub fn run(&self, bars: &[AlignedBar]) -> Result<BacktestResult> {
        self.run_inspect(bars, |_, _| {})
    }

    /// Run, handing the portfolio state after every bar to `inspect`.
    pub fn run_inspect<F>(&self, bars: &[AlignedBar], mut inspect: F) -> Result<BacktestResult>
    where
        F: FnMut(usize, &PortfolioState),
    {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(BacktestError::InsufficientData {
                    required: 1,
                    actual: 0,
                })
            }
        };
        check_bars(bars)?;

        let mut portfolio = Portfolio::new(self.config.initial_balance(), self.config.fee_rate());
        let mut equity_curve: Vec<(NaiveDate, f64)> = Vec::with_capacity(bars.len());

        // Bar 0 is history only.
        equity_curve.push((first.date(), portfolio.equity(first.close())));
        inspect(0, &portfolio.state());

        for i in 1..bars.len() {
            let bar = &bars[i];

            match self.strategy.decide(bars, i, portfolio.phase()) {
                Decision::Buy => {
                    if let Some(trade) = portfolio.buy_all(bar.date(), bar.close()) {
                        debug!(date = %trade.date, price = trade.price, amount = trade.amount, "BUY");
                    }
                }
                Decision::Sell => {
                    if let Some(trade) = portfolio.sell_all(bar.date(), bar.close()) {
                        debug!(date = %trade.date, price = trade.price, amount = trade.amount, "SELL");
                    }
                }
                Decision::Hold => {}
            }

            equity_curve.push((bar.date(), portfolio.equity(bar.close())));
            inspect(i, &portfolio.state());
        }

        let final_state = portfolio.state();
        let final_value = final_state.value_at(last.close());
        let initial_balance = portfolio.initial_balance();
        let trades = portfolio.into_trades();

        let metrics =
            MetricsCalculator::calculate(&trades, &equity_curve, initial_balance, final_value);

        info!(
            bars = bars.len(),
            trades = trades.len(),
            final_value,
            return_pct = metrics.total_return_pct,
            "backtest complete"
        );

        Ok(BacktestResult {
            trades,
            final_state,
            final_value,
            initial_balance,
            equity_curve,
            metrics,
            start_date: first.date(),
            end_date: last.date(),
        })
    }
}

/// Aligned bars can be built by hand, so re-check each bar and the date order.
fn check_bars(bars: &[AlignedBar]) -> Result<()> {
    for bar in bars {
        bar.bar.validate()?;
    }
    for pair in bars.windows(2) {
        if pair[1].date() <= pair[0].date() {
            return Err(BacktestError::DataIntegrity(format!(
                "aligned bars not strictly ascending: {} follows {}",
                pair[1].date(),
                pair[0].date()
            )));
        }
    }
    Ok(())
}
