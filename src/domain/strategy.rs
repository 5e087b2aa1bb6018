//! The validated strategy model.
//!
//! A `StrategyDefinition` is produced once by schema validation and never
//! mutated afterwards. The two strategy flavours are a closed sum type:
//! a definition is either time-based or indicator-based, never both.

use chrono::NaiveTime;

use crate::domain::expr::Expr;
use crate::domain::indicator::IndicatorSpec;
use crate::domain::market::PriceField;

pub const DEFAULT_MAX_DAILY_TRADES: u32 = 1;
pub const DEFAULT_MIN_PIP_DISTANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDefinition {
    pub name: String,
    pub version: String,
    pub description: String,
    pub mode: StrategyMode,
    pub buy: ConditionSpec,
    pub sell: ConditionSpec,
    pub risk: RiskManagement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyMode {
    TimeBased(TimingSpec),
    IndicatorBased(Vec<IndicatorSpec>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSpec {
    pub reference_time: NaiveTime,
    pub reference_price: PriceField,
    pub signal_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionSpec {
    Simple {
        expr: Expr,
        /// Fire only on the false-to-true transition of `expr` between
        /// consecutive snapshots, not merely while it holds.
        crossover: bool,
    },
    Rotation {
        zone: ZoneSpec,
        trigger: TriggerSpec,
    },
}

impl std::fmt::Display for ConditionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionSpec::Simple { expr, crossover } => {
                write!(f, "{expr}")?;
                if *crossover {
                    write!(f, " (crossover)")?;
                }
                Ok(())
            }
            ConditionSpec::Rotation { zone, trigger } => {
                let bound = match zone.direction {
                    ZoneDirection::AllAbove => "above",
                    ZoneDirection::AllBelow => "below",
                };
                let cross = match trigger.direction {
                    CrossDirection::CrossesAbove => "crosses above",
                    CrossDirection::CrossesBelow => "crosses below",
                };
                write!(
                    f,
                    "rotation: [{}] {} {} and {} {} {}",
                    zone.indicators.join(", "),
                    bound,
                    zone.threshold,
                    trigger.indicator,
                    cross,
                    trigger.threshold
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneDirection {
    AllAbove,
    AllBelow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSpec {
    pub direction: ZoneDirection,
    pub threshold: f64,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    CrossesAbove,
    CrossesBelow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub indicator: String,
    pub direction: CrossDirection,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskManagement {
    pub stop_loss_pips: f64,
    pub take_profit_pips: f64,
    pub max_daily_trades: u32,
    pub min_pip_distance: f64,
}
