mod common;

use common::{config, day, series};
use proptest::prelude::*;
use sentiment_backtest::{
    AlignedBar, BacktestEngine, SignalAligner, SignalDirection, SignalEvent, TradeAction,
    TradingStrategy,
};

fn direction() -> impl Strategy<Value = SignalDirection> {
    prop_oneof![
        Just(SignalDirection::Bullish),
        Just(SignalDirection::Bearish),
        Just(SignalDirection::Neutral),
    ]
}

/// Closes plus signal events dated within the series
fn scenario() -> impl Strategy<Value = (Vec<f64>, Vec<SignalEvent>)> {
    prop::collection::vec(1.0f64..10_000.0, 1..80).prop_flat_map(|closes| {
        let len = closes.len();
        let events = prop::collection::vec((0..len, direction()), 0..len * 2).prop_map(|raw| {
            raw.into_iter()
                .map(|(offset, direction)| SignalEvent::new(day(offset), direction))
                .collect::<Vec<_>>()
        });
        (Just(closes), events)
    })
}

proptest! {
    #[test]
    fn state_stays_all_in_or_all_out(
        (closes, events) in scenario(),
        window in 0usize..15,
        fee in 0.0f64..0.99,
    ) {
        let engine = BacktestEngine::new(config(window, 10_000.0, fee));
        let aligned = SignalAligner::align(&series(&closes), &events);

        let result = engine
            .run_inspect(&aligned.bars, |_, state| {
                assert!(state.cash_balance >= 0.0);
                assert!(state.position_size >= 0.0);
                assert!(!(state.cash_balance > 0.0 && state.position_size > 0.0));
            })
            .unwrap();

        prop_assert!(result.final_value >= 0.0);
        prop_assert_eq!(result.equity_curve.len(), closes.len());
    }

    #[test]
    fn ledger_alternates_starting_with_buy(
        (closes, events) in scenario(),
        window in 0usize..10,
    ) {
        let engine = BacktestEngine::new(config(window, 1_000.0, 0.001));
        let result = engine.run_with_signals(&series(&closes), &events).unwrap();

        for (i, trade) in result.trades.iter().enumerate() {
            let expected = if i % 2 == 0 { TradeAction::Buy } else { TradeAction::Sell };
            prop_assert_eq!(trade.action, expected);
        }
        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn no_signals_means_no_trades(
        closes in prop::collection::vec(1.0f64..10_000.0, 1..80),
        window in 0usize..15,
        fee in 0.0f64..0.99,
    ) {
        let engine = BacktestEngine::new(config(window, 2_500.0, fee));
        let result = engine.run_with_signals(&series(&closes), &[]).unwrap();

        prop_assert!(result.trades.is_empty());
        prop_assert_eq!(result.final_value, 2_500.0);
    }

    #[test]
    fn buy_decision_ignores_future_bars(
        (closes, events) in scenario(),
        window in 0usize..10,
        cut in 0usize..80,
        noise in 1.0f64..10_000.0,
    ) {
        let aligned = SignalAligner::align(&series(&closes), &events).bars;
        let cut = cut % aligned.len();

        let mut mutated: Vec<AlignedBar> = aligned.clone();
        for bar in mutated.iter_mut().skip(cut + 1) {
            bar.bar.close = noise;
            bar.bullish_signal = !bar.bullish_signal;
            bar.bearish_signal = !bar.bearish_signal;
        }

        let strategy = TradingStrategy::new(window);
        for i in 0..=cut {
            prop_assert_eq!(
                strategy.should_buy(&aligned, i),
                strategy.should_buy(&mutated, i)
            );
            prop_assert_eq!(
                strategy.should_sell(&aligned, i),
                strategy.should_sell(&mutated, i)
            );
        }
    }

    #[test]
    fn trades_up_to_a_bar_ignore_later_bars(
        (closes, events) in scenario(),
        window in 0usize..10,
        cut in 0usize..80,
    ) {
        let aligned = SignalAligner::align(&series(&closes), &events).bars;
        let cut = cut % aligned.len();
        let engine = BacktestEngine::new(config(window, 1_000.0, 0.001));

        let full = engine.run(&aligned).unwrap();
        let prefix = engine.run(&aligned[..=cut]).unwrap();

        let cutoff = aligned[cut].date();
        let full_prefix: Vec<_> = full.trades.iter().filter(|t| t.date <= cutoff).cloned().collect();
        prop_assert_eq!(full_prefix, prefix.trades);
    }
}
