//! Per-candle strategy evaluation.
//!
//! [`StrategyEngine`] consumes a candle stream one bar at a time and
//! emits at most one [`Signal`] per bar. The engine owns all evaluation
//! state (indicator history, previous snapshot, cross detector, daily
//! trade counter); whether a position is currently open is the caller's
//! concern and is passed in read-only.

use std::collections::{BTreeMap, HashMap};
use std::mem;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::domain::detector::{self, CrossDetector};
use crate::domain::expr_eval;
use crate::domain::indicator::{self, IndicatorSnapshot};
use crate::domain::market::Candle;
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{
    ConditionSpec, CrossDirection, StrategyDefinition, StrategyMode, TimingSpec, TriggerSpec,
    ZoneSpec,
};

/// Baseline candle retention for indicator computation. Bounds memory
/// on long streams; a definition whose indicators warm up over a longer
/// span retains enough candles for that warmup instead.
pub const BASE_CANDLE_HISTORY: usize = 500;

/// Reference price captured earlier in the trading day.
#[derive(Debug, Clone, Copy)]
struct Reference {
    date: NaiveDate,
    price: f64,
}

#[derive(Debug)]
pub struct StrategyEngine {
    definition: StrategyDefinition,
    history: Vec<Candle>,
    history_limit: usize,
    current: IndicatorSnapshot,
    previous: IndicatorSnapshot,
    detector: CrossDetector,
    reference: Option<Reference>,
    buy_eval: Option<bool>,
    sell_eval: Option<bool>,
    trades_today: u32,
    last_trade_date: Option<NaiveDate>,
}

impl StrategyEngine {
    pub fn new(definition: StrategyDefinition) -> Self {
        let history_limit = match &definition.mode {
            StrategyMode::IndicatorBased(specs) => specs
                .iter()
                .map(|spec| spec.kind.min_history())
                .max()
                .unwrap_or(0)
                .max(BASE_CANDLE_HISTORY),
            StrategyMode::TimeBased(_) => BASE_CANDLE_HISTORY,
        };
        Self {
            definition,
            history: Vec::new(),
            history_limit,
            current: IndicatorSnapshot::new(),
            previous: IndicatorSnapshot::new(),
            detector: CrossDetector::new(),
            reference: None,
            buy_eval: None,
            sell_eval: None,
            trades_today: 0,
            last_trade_date: None,
        }
    }

    pub fn definition(&self) -> &StrategyDefinition {
        &self.definition
    }

    /// Advances the engine by one candle.
    ///
    /// Buy conditions are checked before sell conditions; a candle never
    /// produces more than one signal. `position_open` suppresses signals
    /// without consuming the daily trade allowance.
    pub fn on_candle(&mut self, candle: &Candle, position_open: bool) -> Option<Signal> {
        match &self.definition.mode {
            StrategyMode::TimeBased(timing) => {
                let timing = *timing;
                self.on_time_candle(&timing, candle, position_open)
            }
            StrategyMode::IndicatorBased(_) => self.on_indicator_candle(candle, position_open),
        }
    }

    fn on_time_candle(
        &mut self,
        timing: &TimingSpec,
        candle: &Candle,
        position_open: bool,
    ) -> Option<Signal> {
        let date = candle.timestamp.date();
        let time = candle.timestamp.time();

        // A reference never carries across days.
        if self.reference.is_some_and(|r| r.date != date) {
            self.reference = None;
        }

        if time == timing.reference_time {
            let price = timing.reference_price.value(candle);
            debug!(%date, price, "reference price captured");
            self.reference = Some(Reference { date, price });
            return None;
        }

        if time != timing.signal_time {
            return None;
        }

        let Some(reference) = self.reference else {
            debug!(%date, "signal time reached without a reference price");
            return None;
        };

        let distance = (candle.close - reference.price).abs();
        if distance < self.definition.risk.min_pip_distance {
            debug!(distance, "signal suppressed: below minimum pip distance");
            return None;
        }

        let mut vars = HashMap::new();
        vars.insert("signal_price".to_string(), candle.close);
        vars.insert("reference_price".to_string(), reference.price);

        let direction = if simple_condition_true(&self.definition.buy, &vars) {
            Direction::Buy
        } else if simple_condition_true(&self.definition.sell, &vars) {
            Direction::Sell
        } else {
            return None;
        };

        let reason = match direction {
            Direction::Buy => self.definition.buy.to_string(),
            Direction::Sell => self.definition.sell.to_string(),
        };
        let mut metadata = BTreeMap::new();
        metadata.insert("mode".to_string(), "time_based".to_string());
        metadata.insert("reference_price".to_string(), reference.price.to_string());
        metadata.insert("signal_price".to_string(), candle.close.to_string());

        self.try_emit(candle, direction, reason, metadata, position_open)
    }

    fn on_indicator_candle(&mut self, candle: &Candle, position_open: bool) -> Option<Signal> {
        let StrategyMode::IndicatorBased(specs) = &self.definition.mode else {
            return None;
        };

        self.history.push(candle.clone());
        if self.history.len() > self.history_limit {
            self.history.remove(0);
        }

        let snapshot = indicator::compute_snapshot(&self.history, specs);
        self.previous = mem::replace(&mut self.current, snapshot);

        let (buy_fires, buy_now) = self.evaluate_condition(&self.definition.buy, self.buy_eval);
        let (sell_fires, sell_now) = self.evaluate_condition(&self.definition.sell, self.sell_eval);
        self.buy_eval = buy_now;
        self.sell_eval = sell_now;

        let fired = if buy_fires {
            Some((Direction::Buy, self.definition.buy.to_string()))
        } else if sell_fires {
            Some((Direction::Sell, self.definition.sell.to_string()))
        } else {
            None
        };

        // Record after evaluation so crossings compare against the
        // previous candle's values.
        for (alias, value) in &self.current.values {
            self.detector.observe(alias, *value);
        }

        let (direction, reason) = fired?;
        let mut metadata = BTreeMap::new();
        metadata.insert("mode".to_string(), "indicator_based".to_string());
        self.try_emit(candle, direction, reason, metadata, position_open)
    }

    /// Returns (fires now, evaluation outcome now). The outcome is
    /// `None` when the expression cannot be evaluated against the
    /// snapshot; a `crossover` condition fires only when the previous
    /// candle evaluated to `false`, so warmup candles never supply the
    /// false half of a transition.
    fn evaluate_condition(
        &self,
        condition: &ConditionSpec,
        previous: Option<bool>,
    ) -> (bool, Option<bool>) {
        match condition {
            ConditionSpec::Simple { expr, crossover } => {
                let now = match expr_eval::evaluate(expr, &self.current.values) {
                    Ok(result) => Some(result),
                    Err(err) => {
                        trace!(error = %err, "condition evaluation failed");
                        None
                    }
                };
                let fires = now == Some(true) && (!*crossover || previous == Some(false));
                (fires, now)
            }
            ConditionSpec::Rotation { zone, trigger } => (self.rotation_fires(zone, trigger), None),
        }
    }

    /// The zone is checked against the previous snapshot: a rotation
    /// fires exactly when the market was in the zone and the trigger
    /// indicator has just crossed out of it.
    fn rotation_fires(&self, zone: &ZoneSpec, trigger: &TriggerSpec) -> bool {
        if !detector::zone_holds(zone, &self.previous) {
            return false;
        }
        let Some(value) = self.current.get(&trigger.indicator) else {
            return false;
        };
        match trigger.direction {
            CrossDirection::CrossesAbove => {
                self.detector
                    .cross_above(&trigger.indicator, value, trigger.threshold)
            }
            CrossDirection::CrossesBelow => {
                self.detector
                    .cross_below(&trigger.indicator, value, trigger.threshold)
            }
        }
    }

    fn try_emit(
        &mut self,
        candle: &Candle,
        direction: Direction,
        reason: String,
        metadata: BTreeMap<String, String>,
        position_open: bool,
    ) -> Option<Signal> {
        if position_open {
            debug!(%direction, "signal suppressed: position already open");
            return None;
        }

        let date = candle.timestamp.date();
        if self.last_trade_date != Some(date) {
            self.trades_today = 0;
        }
        if self.trades_today >= self.definition.risk.max_daily_trades {
            debug!(
                %direction,
                limit = self.definition.risk.max_daily_trades,
                "signal suppressed: daily trade limit reached"
            );
            return None;
        }

        self.trades_today += 1;
        self.last_trade_date = Some(date);

        let signal = Signal {
            direction,
            price: candle.close,
            strength: 1.0,
            confidence: 1.0,
            reason,
            timestamp: candle.timestamp,
            metadata,
        };
        debug!(%direction, price = signal.price, %signal.timestamp, "signal emitted");
        Some(signal)
    }
}

fn simple_condition_true(condition: &ConditionSpec, vars: &HashMap<String, f64>) -> bool {
    match condition {
        ConditionSpec::Simple { expr, .. } => match expr_eval::evaluate(expr, vars) {
            Ok(result) => result,
            Err(err) => {
                trace!(error = %err, "condition evaluation failed");
                false
            }
        },
        ConditionSpec::Rotation { .. } => false,
    }
}
