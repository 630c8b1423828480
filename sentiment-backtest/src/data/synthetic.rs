use chrono::{Duration, NaiveDate};
use common::{RawCandle, SignalDirection, SignalEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::series::PriceSeries;

const MILLIS_PER_DAY: i64 = 86_400_000;
/// 2024-01-01T00:00:00Z
const START_MILLIS: i64 = 1_704_067_200_000;

/// Generate daily BTC-like candles starting 2024-01-01.
///
/// The same `seed` always yields the same candles.
pub fn generate_synthetic_candles(days: usize, initial_price: f64, seed: u64) -> Vec<RawCandle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut candles = Vec::with_capacity(days);

    let mut price = initial_price;

    // ~3% daily moves, slight upward drift
    let daily_volatility = 0.03;
    let drift = 0.0005;

    for i in 0..days {
        let open_time = START_MILLIS + i as i64 * MILLIS_PER_DAY;

        let random_return: f64 = rng.gen_range(-1.0..1.0);
        let new_price = price * (1.0 + drift + daily_volatility * random_return);

        let open = price;
        let close = new_price;
        let intraday_range = price * rng.gen_range(0.005..0.02);
        let high = open.max(close) + intraday_range;
        let low = open.min(close) - intraday_range;

        let volume = 20_000.0 * rng.gen_range(0.8..1.2) * (1.0 + random_return.abs());
        let trades_count = rng.gen_range(500_000..1_500_000);

        candles.push(RawCandle {
            open_time,
            close_time: open_time + MILLIS_PER_DAY - 1,
            open,
            high,
            low,
            close,
            volume,
            trades_count,
        });

        price = new_price;
    }

    candles
}

/// Emit signals for roughly `rate` of the bars, with random directions.
///
/// Some days get a second, independent signal so conflicting days occur.
pub fn generate_synthetic_signals(series: &PriceSeries, rate: f64, seed: u64) -> Vec<SignalEvent> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
    let mut events = Vec::new();

    for bar in series {
        if !rng.gen_bool(rate) {
            continue;
        }
        let extra = rng.gen_bool(0.2);
        for _ in 0..(1 + usize::from(extra)) {
            events.push(SignalEvent {
                date: bar.date,
                direction: random_direction(&mut rng),
                credibility_flag: Some(rng.gen_bool(0.1)),
            });
        }
    }

    events
}

fn random_direction(rng: &mut StdRng) -> SignalDirection {
    match rng.gen_range(0..3) {
        0 => SignalDirection::Bullish,
        1 => SignalDirection::Bearish,
        _ => SignalDirection::Neutral,
    }
}

/// First date produced by [`generate_synthetic_candles`]
pub fn synthetic_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Last date produced for `days` candles
pub fn synthetic_end_date(days: usize) -> NaiveDate {
    synthetic_start_date() + Duration::days(days.saturating_sub(1) as i64)
}
