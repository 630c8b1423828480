use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use sentiment_backtest::data::{synthetic_end_date, synthetic_start_date};
use sentiment_backtest::{
    generate_synthetic_candles, generate_synthetic_signals, load_prices, BacktestEngine,
    BacktestResult, FileSignalSource, PriceSeries, SignalAligner, SignalSource, StrategyConfig,
};

#[derive(Parser, Debug)]
#[command(name = "sentiment-backtest")]
#[command(version = "0.1.0")]
#[command(about = "Replay daily candles against news-sentiment signals", long_about = None)]
struct Args {
    /// Candle file (CSV/JSON), or a directory of `<SYMBOL>.csv` files.
    /// If not provided, uses synthetic data.
    #[arg(short = 'p', long)]
    prices: Option<PathBuf>,

    /// Signal file (CSV/JSON). If not provided, synthetic signals are generated
    /// for synthetic prices and no signals are used for file prices.
    #[arg(short = 'g', long)]
    signals: Option<PathBuf>,

    /// Strategy config file (JSON); flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Symbol to read from a `--prices` directory; also labels the report
    #[arg(short, long, default_value = "BTCUSDT")]
    symbol: String,

    /// First date to replay (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date to replay (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Moving average window
    #[arg(short, long)]
    window: Option<usize>,

    /// Initial balance
    #[arg(short = 'b', long)]
    initial_balance: Option<f64>,

    /// Fee rate per fill (0.001 = 0.1%)
    #[arg(short, long)]
    fee_rate: Option<f64>,

    /// Number of days of synthetic data
    #[arg(short, long, default_value = "365")]
    days: usize,

    /// Initial price for synthetic data
    #[arg(long, default_value = "42000.0")]
    initial_price: f64,

    /// Share of synthetic days carrying a signal
    #[arg(long, default_value = "0.3")]
    signal_rate: f64,

    /// Seed for synthetic data
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    output: String,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG directives override it
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&args.log_level)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    info!(
        window = config.moving_average_window(),
        initial_balance = config.initial_balance(),
        fee_rate = config.fee_rate(),
        "strategy config"
    );

    let start = args.start.unwrap_or(NaiveDate::MIN);
    let end = args.end.unwrap_or(NaiveDate::MAX);

    // Load or generate data
    let series = match &args.prices {
        Some(path) => {
            info!(path = %path.display(), symbol = %args.symbol, "loading candles");
            load_prices(path, &args.symbol, start, end)?
        }
        None => {
            info!(
                days = args.days,
                initial_price = args.initial_price,
                seed = args.seed,
                "generating synthetic candles ({} to {})",
                synthetic_start_date(),
                synthetic_end_date(args.days)
            );
            PriceSeries::from_candles(generate_synthetic_candles(
                args.days,
                args.initial_price,
                args.seed,
            ))?
            .between(start, end)
        }
    };

    let events = match (&args.signals, &args.prices) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading signals");
            FileSignalSource::new(path).signals(start, end)?
        }
        (None, None) => generate_synthetic_signals(&series, args.signal_rate, args.seed),
        (None, Some(_)) => Vec::new(),
    };

    let aligned = SignalAligner::align(&series, &events);
    info!(
        symbol = %args.symbol,
        bars = series.len(),
        events = aligned.stats.events,
        matched = aligned.stats.matched_events,
        flagged = aligned.stats.flagged_events,
        "signals aligned"
    );

    let engine = BacktestEngine::new(config);
    let result = engine.run(&aligned.bars)?;

    // Output result
    match args.output.as_str() {
        "json" => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
        }
        "text" => print_text_report(&args.symbol, &result),
        other => {
            tracing::warn!("Unknown output format: {}. Using text.", other);
            print_text_report(&args.symbol, &result);
        }
    }

    Ok(())
}

/// `level` is the default directive; `RUST_LOG` can refine it per target.
fn log_filter(level: &str) -> Result<EnvFilter> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level: {}", level))?;
    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy())
}

fn build_config(args: &Args) -> Result<StrategyConfig> {
    let mut config = match &args.config {
        Some(path) => StrategyConfig::from_json_file(path)?,
        None => StrategyConfig::default(),
    };
    if let Some(window) = args.window {
        config = config.with_window(window);
    }
    if let Some(balance) = args.initial_balance {
        config = config.with_initial_balance(balance)?;
    }
    if let Some(fee_rate) = args.fee_rate {
        config = config.with_fee_rate(fee_rate)?;
    }
    Ok(config)
}

fn print_text_report(symbol: &str, result: &BacktestResult) {
    let metrics = &result.metrics;

    println!();
    println!("================================================================");
    println!("  BACKTEST REPORT - {} sentiment strategy", symbol);
    println!("================================================================");
    println!();
    println!("  Period: {} to {}", result.start_date, result.end_date);
    println!("  Duration: {} days", result.equity_curve.len());
    println!();
    println!("----------------------------------------------------------------");
    println!("  CAPITAL");
    println!("----------------------------------------------------------------");
    println!("  Initial Balance:  ${:>12.2}", result.initial_balance);
    println!("  Final Value:      ${:>12.2}", result.final_value);
    println!(
        "  Total Return:     ${:>12.2} ({:+.2}%)",
        metrics.total_return, metrics.total_return_pct
    );
    println!("  Cash:             ${:>12.2}", result.final_state.cash_balance);
    println!("  Position:         {:>13.6}", result.final_state.position_size);
    println!();
    println!("----------------------------------------------------------------");
    println!("  TRADE STATISTICS");
    println!("----------------------------------------------------------------");
    println!("  Buys / Sells:     {:>6} / {:<6}", metrics.buy_count, metrics.sell_count);
    println!("  Round Trips:      {:>12}", metrics.round_trips);
    println!("  Winning Trades:   {:>12}", metrics.winning_trades);
    println!("  Losing Trades:    {:>12}", metrics.losing_trades);
    println!("  Win Rate:         {:>12.1}%", metrics.win_rate);
    println!("  Fees Paid:        ${:>12.2}", metrics.total_fees);
    println!("  Max Drawdown:     {:>12.2}%", metrics.max_drawdown_pct);
    println!("  Exposure:         {:>12.1}%", metrics.exposure_pct);
    println!();
    println!("================================================================");

    if !result.trades.is_empty() {
        println!();
        println!("  RECENT TRADES (last 5)");
        println!("----------------------------------------------------------------");
        for trade in result.trades.iter().rev().take(5) {
            println!(
                "  {} | {:<4} | {:>12.6} @ ${:.2} | fee ${:.2}",
                trade.date, trade.action, trade.amount, trade.price, trade.fee
            );
        }
        println!();
    }
}
