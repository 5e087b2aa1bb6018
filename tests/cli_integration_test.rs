//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Strategy loading (load_definition) and its exit code mapping
//! - Full pipeline with MockMarketData and report files on disk
//! - Replay command argument handling and CSV tick loading
//! - End-to-end runs over real temp files (strategy + candles + ticks)

mod common;

use common::*;
use signalbox::cli::{self, Cli, Command};
use signalbox::domain::market::Candle;
use std::io::Write;
use std::path::PathBuf;

fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const INVALID_STRATEGY: &str = r#"{
    "name": "broken",
    "version": "not-a-version",
    "description": "too short",
    "timing": {
        "reference_time": "09:30",
        "reference_price": "close",
        "signal_time": "10:00"
    },
    "conditions": {
        "buy": { "compare": "signal_price > reference_price" },
        "sell": { "compare": "signal_price < reference_price" }
    },
    "risk_management": { "stop_loss_pips": 10, "take_profit_pips": 20 }
}"#;

const CANDLE_CSV: &str = "\
timestamp,open,high,low,close,volume
2024-01-15 09:30:00,99.5,100.5,99.0,100.0,1200
2024-01-15 10:00:00,100.0,102.5,99.8,102.0,1500
";

const TICK_CSV: &str = "\
timestamp,bid,ask
2024-01-15 10:01:00,110.0,110.3
2024-01-15 10:02:00,122.4,122.7
";

mod strategy_loading {
    use super::*;

    #[test]
    fn load_valid_document() {
        let file = write_temp_file(TIME_BASED_STRATEGY);
        let path = PathBuf::from(file.path());

        let definition = cli::load_definition(&path).unwrap();

        assert_eq!(definition.name, "morning_breakout");
        assert_eq!(definition.version, "1.0.0");
    }

    #[test]
    fn missing_file_maps_to_parse_exit_code() {
        let path = PathBuf::from("/nonexistent/path/strategy.json");
        let exit_code = cli::load_definition(&path).unwrap_err();
        // ExitCode doesn't implement PartialEq, so check via report format
        let report = format!("{exit_code:?}");
        assert!(report.contains("2"), "expected parse error exit, got: {report}");
    }

    #[test]
    fn malformed_json_maps_to_parse_exit_code() {
        let file = write_temp_file("{ \"name\": \"oops\"");
        let path = PathBuf::from(file.path());

        let exit_code = cli::load_definition(&path).unwrap_err();
        let report = format!("{exit_code:?}");
        assert!(report.contains("2"), "expected parse error exit, got: {report}");
    }

    #[test]
    fn invalid_document_maps_to_validation_exit_code() {
        let file = write_temp_file(INVALID_STRATEGY);
        let path = PathBuf::from(file.path());

        let exit_code = cli::load_definition(&path).unwrap_err();
        let report = format!("{exit_code:?}");
        assert!(report.contains("3"), "expected validation exit, got: {report}");
    }
}

mod backtest_pipeline {
    use super::*;

    fn two_day_candles() -> Vec<Candle> {
        vec![
            make_candle("2024-01-15 09:30:00", 100.0),
            make_candle("2024-01-15 10:00:00", 102.0),
            make_candle("2024-01-16 09:30:00", 105.0),
            make_candle("2024-01-16 10:00:00", 104.0),
        ]
    }

    #[test]
    fn pipeline_writes_json_report() {
        let mock = MockMarketData::new()
            .with_candles(two_day_candles())
            .with_ticks(vec![
                make_tick("2024-01-15 10:01:00", 122.5, 122.7),
                make_tick("2024-01-16 10:01:00", 114.3, 114.5),
            ]);
        let definition = definition_from(TIME_BASED_STRATEGY);

        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("report.json");

        let exit_code = cli::run_backtest_pipeline(&mock, definition, 1.0, Some(&output));

        let report = format!("{exit_code:?}");
        assert!(report.contains("0"), "expected success, got: {report}");
        assert!(output.exists(), "report file should be written");

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("morning_breakout"));
        assert!(content.contains("TAKE_PROFIT"));
    }

    #[test]
    fn pipeline_without_ticks_reports_signals_only() {
        let mock = MockMarketData::new().with_candles(two_day_candles());
        let definition = definition_from(TIME_BASED_STRATEGY);

        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("report.json");

        let exit_code = cli::run_backtest_pipeline(&mock, definition, 1.0, Some(&output));

        let report = format!("{exit_code:?}");
        assert!(report.contains("0"), "expected success, got: {report}");

        let content = std::fs::read_to_string(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["signals"].as_array().unwrap().len(), 2);
        assert!(value["trades"].as_array().unwrap().is_empty());
        assert_eq!(value["candles_processed"], 4);
    }

    #[test]
    fn candle_load_failure_maps_to_market_data_exit() {
        let mock = MockMarketData::new().with_candle_error("candle file unreadable");
        let definition = definition_from(TIME_BASED_STRATEGY);

        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("report.json");

        let exit_code = cli::run_backtest_pipeline(&mock, definition, 1.0, Some(&output));

        let report = format!("{exit_code:?}");
        assert!(report.contains("4"), "expected market data exit, got: {report}");
        assert!(!output.exists(), "no report should be written");
    }

    #[test]
    fn tick_load_failure_maps_to_market_data_exit() {
        let mock = MockMarketData::new()
            .with_candles(two_day_candles())
            .with_tick_error("tick file unreadable");
        let definition = definition_from(TIME_BASED_STRATEGY);

        let exit_code = cli::run_backtest_pipeline(&mock, definition, 1.0, None);

        let report = format!("{exit_code:?}");
        assert!(report.contains("4"), "expected market data exit, got: {report}");
    }
}

mod replay_command {
    use super::*;

    fn replay_args(tick_path: PathBuf) -> Command {
        Command::Replay {
            ticks: tick_path,
            direction: "BUY".to_string(),
            entry_price: 100.0,
            entry_time: "2024-01-15 10:00:00".to_string(),
            stop_loss_pips: 10.0,
            take_profit_pips: 20.0,
            pip_value: 1.0,
        }
    }

    #[test]
    fn replay_resolves_trade_from_csv() {
        let file = write_temp_file(TICK_CSV);
        let args = Cli {
            command: replay_args(PathBuf::from(file.path())),
        };

        let exit_code = cli::run(args);

        let report = format!("{exit_code:?}");
        assert!(report.contains("0"), "expected success, got: {report}");
    }

    #[test]
    fn replay_rejects_unknown_direction() {
        let file = write_temp_file(TICK_CSV);
        let args = Cli {
            command: Command::Replay {
                ticks: PathBuf::from(file.path()),
                direction: "LONG".to_string(),
                entry_price: 100.0,
                entry_time: "2024-01-15 10:00:00".to_string(),
                stop_loss_pips: 10.0,
                take_profit_pips: 20.0,
                pip_value: 1.0,
            },
        };

        let exit_code = cli::run(args);

        let report = format!("{exit_code:?}");
        assert!(report.contains("5"), "expected replay error exit, got: {report}");
    }

    #[test]
    fn replay_rejects_malformed_entry_time() {
        let file = write_temp_file(TICK_CSV);
        let args = Cli {
            command: Command::Replay {
                ticks: PathBuf::from(file.path()),
                direction: "SELL".to_string(),
                entry_price: 100.0,
                entry_time: "yesterday".to_string(),
                stop_loss_pips: 10.0,
                take_profit_pips: 20.0,
                pip_value: 1.0,
            },
        };

        let exit_code = cli::run(args);

        let report = format!("{exit_code:?}");
        assert!(report.contains("5"), "expected replay error exit, got: {report}");
    }

    #[test]
    fn replay_missing_tick_file_is_a_market_data_error() {
        let args = Cli {
            command: replay_args(PathBuf::from("/nonexistent/ticks.csv")),
        };

        let exit_code = cli::run(args);

        let report = format!("{exit_code:?}");
        assert!(report.contains("4"), "expected market data exit, got: {report}");
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn validate_command_accepts_valid_document() {
        let file = write_temp_file(STOCHASTIC_ROTATION_STRATEGY);
        let args = Cli {
            command: Command::Validate {
                strategy: PathBuf::from(file.path()),
            },
        };

        let exit_code = cli::run(args);

        let report = format!("{exit_code:?}");
        assert!(report.contains("0"), "expected success, got: {report}");
    }

    #[test]
    fn run_command_over_real_csv_files() {
        let strategy_file = write_temp_file(TIME_BASED_STRATEGY);
        let candle_file = write_temp_file(CANDLE_CSV);
        let tick_file = write_temp_file(TICK_CSV);

        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("report.json");

        let args = Cli {
            command: Command::Run {
                strategy: PathBuf::from(strategy_file.path()),
                candles: PathBuf::from(candle_file.path()),
                ticks: Some(PathBuf::from(tick_file.path())),
                pip_value: 1.0,
                output: Some(output.clone()),
            },
        };

        let exit_code = cli::run(args);

        let report = format!("{exit_code:?}");
        assert!(report.contains("0"), "expected success, got: {report}");

        // 09:30 close 100 -> 10:00 close 102 is a buy; the second tick
        // reaches the 122 target.
        let content = std::fs::read_to_string(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["strategy_name"], "morning_breakout");
        assert_eq!(value["trades"][0]["exit_reason"], "TAKE_PROFIT");
        assert_eq!(value["trades"][0]["pips_gained"], 20.0);
    }
}
