//! End-to-end backtest driver.
//!
//! Feeds a candle stream through a [`StrategyEngine`] and resolves each
//! emitted signal against the tick stream. Position state lives here:
//! the engine is told whether a trade is open, and a new trade cannot
//! start until the previous one has exited. With no ticks the driver
//! degrades to signal-only mode and applies no position gating.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::domain::engine::StrategyEngine;
use crate::domain::market::{Candle, Tick};
use crate::domain::replay::{self, ExitReason, TradeEntry};
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::StrategyDefinition;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedTrade {
    pub direction: Direction,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_reason: ExitReason,
    pub exit_price: f64,
    pub exit_timestamp: Option<NaiveDateTime>,
    pub pips_gained: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub strategy_name: String,
    pub candles_processed: usize,
    pub signals: Vec<Signal>,
    pub trades: Vec<CompletedTrade>,
}

impl BacktestReport {
    pub fn total_pips(&self) -> f64 {
        self.trades.iter().map(|t| t.pips_gained).sum()
    }

    pub fn wins(&self) -> usize {
        self.trades.iter().filter(|t| t.pips_gained > 0.0).count()
    }

    pub fn losses(&self) -> usize {
        self.trades.iter().filter(|t| t.pips_gained < 0.0).count()
    }
}

/// Runs `definition` over the candle stream, replaying each signal
/// against `ticks`.
///
/// A position opened by a signal blocks further entries until the first
/// candle at or after its exit timestamp. A trade the tick stream never
/// resolves stays open for the rest of the run.
pub fn run_backtest(
    definition: StrategyDefinition,
    candles: &[Candle],
    ticks: &[Tick],
    pip_value: f64,
) -> BacktestReport {
    let strategy_name = definition.name.clone();
    let risk = definition.risk;
    let mut engine = StrategyEngine::new(definition);

    let mut signals = Vec::new();
    let mut trades = Vec::new();
    let mut open_until: Option<NaiveDateTime> = None;
    let mut held_forever = false;

    for candle in candles {
        if let Some(exit_ts) = open_until {
            if candle.timestamp >= exit_ts {
                open_until = None;
            }
        }
        let position_open = held_forever || open_until.is_some();

        let Some(signal) = engine.on_candle(candle, position_open) else {
            continue;
        };

        if !ticks.is_empty() {
            let entry = TradeEntry {
                timestamp: signal.timestamp,
                price: signal.price,
                direction: signal.direction,
            };
            let result = replay::replay_trade(&entry, ticks, &risk, pip_value);
            match result.exit_timestamp {
                Some(exit_ts) => open_until = Some(exit_ts),
                None => held_forever = true,
            }
            trades.push(CompletedTrade {
                direction: signal.direction,
                entry_timestamp: signal.timestamp,
                entry_price: signal.price,
                exit_reason: result.exit_reason,
                exit_price: result.exit_price,
                exit_timestamp: result.exit_timestamp,
                pips_gained: result.pips_gained,
            });
        }

        signals.push(signal);
    }

    info!(
        strategy = %strategy_name,
        candles = candles.len(),
        signals = signals.len(),
        trades = trades.len(),
        "backtest complete"
    );

    BacktestReport {
        strategy_name,
        candles_processed: candles.len(),
        signals,
        trades,
    }
}
