//! Raw strategy document shapes, straight off the wire.
//!
//! Every field is optional here: deserialization only rejects type
//! mismatches, while missing or contradictory content is reported field
//! by field by [`crate::domain::schema::validate`]. This keeps "the file
//! is not valid JSON for this shape" separate from "the strategy is
//! incomplete", which produce different errors for the caller.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategyDocument {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub timing: Option<TimingDocument>,
    pub indicators: Option<Vec<IndicatorDocument>>,
    pub conditions: Option<ConditionsDocument>,
    pub risk_management: Option<RiskDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimingDocument {
    pub reference_time: Option<String>,
    pub reference_price: Option<String>,
    pub signal_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndicatorDocument {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub alias: Option<String>,
    pub period: Option<f64>,
    pub fast_period: Option<f64>,
    pub slow_period: Option<f64>,
    pub signal_period: Option<f64>,
    pub k_period: Option<f64>,
    pub k_smoothing: Option<f64>,
    pub d_smoothing: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConditionsDocument {
    pub buy: Option<ConditionDocument>,
    pub sell: Option<ConditionDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConditionDocument {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub compare: Option<String>,
    pub crossover: Option<bool>,
    pub zone: Option<ZoneDocument>,
    pub trigger: Option<TriggerDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ZoneDocument {
    pub all_above: Option<f64>,
    pub all_below: Option<f64>,
    pub indicators: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TriggerDocument {
    pub indicator: Option<String>,
    pub crosses_above: Option<f64>,
    pub crosses_below: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RiskDocument {
    pub stop_loss_pips: Option<f64>,
    pub take_profit_pips: Option<f64>,
    pub max_daily_trades: Option<f64>,
    pub min_pip_distance: Option<f64>,
}
