//! CLI definition and dispatch.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use crate::adapters::csv_adapter::{self, CsvMarketData, TIMESTAMP_FORMAT};
use crate::domain::backtest::{self, BacktestReport};
use crate::domain::document::StrategyDocument;
use crate::domain::error::SignalboxError;
use crate::domain::replay::{self, TradeEntry};
use crate::domain::schema;
use crate::domain::signal::Direction;
use crate::domain::strategy::{
    DEFAULT_MIN_PIP_DISTANCE, RiskManagement, StrategyDefinition, StrategyMode,
};
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "signalbox", about = "Declarative trading-rule engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a strategy document
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Run a strategy over candles, replaying signals against ticks
    Run {
        #[arg(short, long)]
        strategy: PathBuf,
        #[arg(short, long)]
        candles: PathBuf,
        #[arg(short, long)]
        ticks: Option<PathBuf>,
        /// Price move that equals one pip
        #[arg(long, default_value_t = 1.0)]
        pip_value: f64,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a single trade against a tick stream
    Replay {
        #[arg(short, long)]
        ticks: PathBuf,
        /// BUY or SELL
        #[arg(long)]
        direction: String,
        #[arg(long)]
        entry_price: f64,
        /// Entry timestamp, YYYY-MM-DD HH:MM:SS
        #[arg(long)]
        entry_time: String,
        #[arg(long)]
        stop_loss_pips: f64,
        #[arg(long)]
        take_profit_pips: f64,
        #[arg(long, default_value_t = 1.0)]
        pip_value: f64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Run {
            strategy,
            candles,
            ticks,
            pip_value,
            output,
        } => run_run(&strategy, candles, ticks, pip_value, output.as_ref()),
        Command::Replay {
            ticks,
            direction,
            entry_price,
            entry_time,
            stop_loss_pips,
            take_profit_pips,
            pip_value,
        } => run_replay(
            &ticks,
            &direction,
            entry_price,
            &entry_time,
            stop_loss_pips,
            take_profit_pips,
            pip_value,
        ),
    }
}

/// Reads, parses and validates a strategy document, reporting failures
/// on stderr and mapping them to the process exit code.
pub fn load_definition(path: &PathBuf) -> Result<StrategyDefinition, ExitCode> {
    let content = fs::read_to_string(path).map_err(|e| {
        let err = SignalboxError::DocumentParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;

    let document: StrategyDocument = serde_json::from_str(&content).map_err(|e| {
        let err = SignalboxError::DocumentParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;

    schema::validate(&document).map_err(|errors| {
        eprintln!("error: strategy document is invalid:");
        for e in &errors {
            eprintln!("  {e}");
        }
        let err = SignalboxError::StrategyInvalid { errors };
        ExitCode::from(&err)
    })
}

fn run_validate(strategy_path: &PathBuf) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let definition = match load_definition(strategy_path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    eprintln!("\nStrategy: {} v{}", definition.name, definition.version);
    eprintln!("  {}", definition.description);

    match &definition.mode {
        StrategyMode::TimeBased(timing) => {
            eprintln!(
                "\nMode: time-based (reference {:?} at {}, signal at {})",
                timing.reference_price, timing.reference_time, timing.signal_time
            );
        }
        StrategyMode::IndicatorBased(specs) => {
            eprintln!("\nMode: indicator-based, {} indicators:", specs.len());
            for spec in specs {
                eprintln!("  {}: {}", spec.alias, spec.kind);
            }
        }
    }

    eprintln!("\nConditions:");
    eprintln!("  buy:  {}", definition.buy);
    eprintln!("  sell: {}", definition.sell);

    eprintln!("\nRisk:");
    eprintln!("  stop loss:   {} pips", definition.risk.stop_loss_pips);
    eprintln!("  take profit: {} pips", definition.risk.take_profit_pips);
    eprintln!("  daily limit: {} trades", definition.risk.max_daily_trades);

    eprintln!("\nStrategy document is valid.");
    ExitCode::SUCCESS
}

fn run_run(
    strategy_path: &PathBuf,
    candle_path: PathBuf,
    tick_path: Option<PathBuf>,
    pip_value: f64,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading strategy from {}", strategy_path.display());
    let definition = match load_definition(strategy_path) {
        Ok(d) => d,
        Err(code) => return code,
    };
    eprintln!("Loaded strategy: {} v{}", definition.name, definition.version);

    let port = CsvMarketData::new(candle_path, tick_path);
    run_backtest_pipeline(&port, definition, pip_value, output_path)
}

pub fn run_backtest_pipeline(
    data_port: &dyn MarketDataPort,
    definition: StrategyDefinition,
    pip_value: f64,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let candles = match data_port.load_candles() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let ticks = match data_port.load_ticks() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Running {}: {} candles, {} ticks",
        definition.name,
        candles.len(),
        ticks.len()
    );
    if ticks.is_empty() {
        eprintln!("  No tick data: signals will not be replayed into trades");
    }

    let report = backtest::run_backtest(definition, &candles, &ticks, pip_value);

    eprintln!("\n=== Results ===");
    eprintln!("Candles: {}", report.candles_processed);
    eprintln!("Signals: {}", report.signals.len());
    for signal in &report.signals {
        eprintln!(
            "  {} {} @ {} ({})",
            signal.timestamp, signal.direction, signal.price, signal.reason
        );
    }
    if !report.trades.is_empty() {
        eprintln!("Trades:  {}", report.trades.len());
        for trade in &report.trades {
            eprintln!(
                "  {} {} @ {} -> {} {:+.1} pips",
                trade.entry_timestamp,
                trade.direction,
                trade.entry_price,
                trade.exit_reason,
                trade.pips_gained
            );
        }
        eprintln!("Won/lost: {}/{}", report.wins(), report.losses());
        eprintln!("Net pips: {:+.1}", report.total_pips());
    }

    write_report(&report, output_path)
}

fn write_report(report: &BacktestReport, output_path: Option<&PathBuf>) -> ExitCode {
    let json = match serde_json::to_string_pretty(report) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: failed to serialize report: {e}");
            return ExitCode::from(1);
        }
    };

    match output_path {
        Some(path) => match fs::write(path, &json) {
            Ok(()) => {
                eprintln!("\nReport written to: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to write report: {e}");
                ExitCode::from(1)
            }
        },
        None => {
            println!("{json}");
            ExitCode::SUCCESS
        }
    }
}

fn run_replay(
    tick_path: &PathBuf,
    direction: &str,
    entry_price: f64,
    entry_time: &str,
    stop_loss_pips: f64,
    take_profit_pips: f64,
    pip_value: f64,
) -> ExitCode {
    let direction = match Direction::from_name(direction) {
        Some(d) => d,
        None => {
            let err = SignalboxError::Replay {
                reason: format!("unknown direction '{direction}' (expected BUY or SELL)"),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let timestamp = match NaiveDateTime::parse_from_str(entry_time, TIMESTAMP_FORMAT) {
        Ok(t) => t,
        Err(_) => {
            let err = SignalboxError::Replay {
                reason: format!(
                    "invalid entry time '{entry_time}' (expected YYYY-MM-DD HH:MM:SS)"
                ),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    if stop_loss_pips <= 0.0 || take_profit_pips <= 0.0 {
        let err = SignalboxError::Replay {
            reason: "stop and target distances must be positive".to_string(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    let ticks = match csv_adapter::load_ticks_from(tick_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let risk = RiskManagement {
        stop_loss_pips,
        take_profit_pips,
        max_daily_trades: 1,
        min_pip_distance: DEFAULT_MIN_PIP_DISTANCE,
    };
    let entry = TradeEntry {
        timestamp,
        price: entry_price,
        direction,
    };

    eprintln!(
        "Replaying {} trade from {} @ {} over {} ticks",
        direction,
        timestamp,
        entry_price,
        ticks.len()
    );

    let result = replay::replay_trade(&entry, &ticks, &risk, pip_value);

    eprintln!("\n=== Replay Result ===");
    eprintln!("Exit:       {}", result.exit_reason);
    eprintln!("Price:      {}", result.exit_price);
    match result.exit_timestamp {
        Some(ts) => eprintln!("Time:       {ts}"),
        None => eprintln!("Time:       (stream exhausted)"),
    }
    eprintln!("Pips:       {:+.1}", result.pips_gained);
    eprintln!("Ticks used: {}", result.ticks_consumed);

    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize result: {e}");
            ExitCode::from(1)
        }
    }
}
