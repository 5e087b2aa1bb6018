//! Tick-level trade replay.
//!
//! Walks a recorded bid/ask stream forward from a trade entry and
//! resolves which protective level was touched first. Long trades exit
//! against the bid, short trades against the ask. When a tick gaps
//! through a level the trade still exits at the level itself, the same
//! price a resting stop or limit order would have been filled at.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::domain::market::Tick;
use crate::domain::signal::Direction;
use crate::domain::strategy::RiskManagement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    NoExit,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::NoExit => "NO_EXIT",
        };
        write!(f, "{name}")
    }
}

/// The fill a replay starts from.
#[derive(Debug, Clone, Copy)]
pub struct TradeEntry {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReplayResult {
    pub exit_reason: ExitReason,
    pub exit_price: f64,
    pub exit_timestamp: Option<NaiveDateTime>,
    pub pips_gained: f64,
    /// Ticks evaluated, excluding any dated before the entry.
    pub ticks_consumed: usize,
}

/// Replays `ticks` against the protective levels derived from `risk`.
///
/// The stop is checked before the target on every tick, so a tick that
/// somehow satisfies both resolves as a stop. Ticks earlier than the
/// entry timestamp are skipped without being counted.
pub fn replay_trade(
    entry: &TradeEntry,
    ticks: &[Tick],
    risk: &RiskManagement,
    pip_value: f64,
) -> TradeReplayResult {
    let (stop_level, target_level) = match entry.direction {
        Direction::Buy => (
            entry.price - risk.stop_loss_pips * pip_value,
            entry.price + risk.take_profit_pips * pip_value,
        ),
        Direction::Sell => (
            entry.price + risk.stop_loss_pips * pip_value,
            entry.price - risk.take_profit_pips * pip_value,
        ),
    };

    let mut consumed = 0;
    for tick in ticks {
        if tick.timestamp < entry.timestamp {
            continue;
        }
        consumed += 1;

        // Longs are closed by selling at the bid, shorts by buying at
        // the ask.
        let price = match entry.direction {
            Direction::Buy => tick.bid,
            Direction::Sell => tick.ask,
        };

        let stopped = match entry.direction {
            Direction::Buy => price <= stop_level,
            Direction::Sell => price >= stop_level,
        };
        if stopped {
            debug!(level = stop_level, %tick.timestamp, "stop loss hit");
            return TradeReplayResult {
                exit_reason: ExitReason::StopLoss,
                exit_price: stop_level,
                exit_timestamp: Some(tick.timestamp),
                pips_gained: -risk.stop_loss_pips,
                ticks_consumed: consumed,
            };
        }

        let target_hit = match entry.direction {
            Direction::Buy => price >= target_level,
            Direction::Sell => price <= target_level,
        };
        if target_hit {
            debug!(level = target_level, %tick.timestamp, "take profit hit");
            return TradeReplayResult {
                exit_reason: ExitReason::TakeProfit,
                exit_price: target_level,
                exit_timestamp: Some(tick.timestamp),
                pips_gained: risk.take_profit_pips,
                ticks_consumed: consumed,
            };
        }
    }

    debug!(consumed, "tick stream exhausted with no exit");
    TradeReplayResult {
        exit_reason: ExitReason::NoExit,
        exit_price: entry.price,
        exit_timestamp: None,
        pips_gained: 0.0,
        ticks_consumed: consumed,
    }
}
