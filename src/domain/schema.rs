//! Strategy document validation.
//!
//! Turns a raw [`StrategyDocument`] into an immutable
//! [`StrategyDefinition`], or a list of errors each tied to the field
//! that broke a rule. Every rule is checked rather than stopping at the
//! first violation, so a caller can fix a document in one round trip.

use std::collections::HashSet;

use chrono::NaiveTime;
use tracing::debug;

use crate::domain::document::{
    ConditionDocument, IndicatorDocument, StrategyDocument, TimingDocument, TriggerDocument,
    ZoneDocument,
};
use crate::domain::error::ValidationError;
use crate::domain::expr_parser;
use crate::domain::indicator::{
    DEFAULT_D_SMOOTHING, DEFAULT_FAST, DEFAULT_K_PERIOD, DEFAULT_K_SMOOTHING, DEFAULT_SIGNAL,
    DEFAULT_SLOW, IndicatorKind, IndicatorSpec,
};
use crate::domain::market::PriceField;
use crate::domain::strategy::{
    ConditionSpec, CrossDirection, DEFAULT_MAX_DAILY_TRADES, DEFAULT_MIN_PIP_DISTANCE,
    RiskManagement, StrategyDefinition, StrategyMode, TimingSpec, TriggerSpec, ZoneDirection,
    ZoneSpec,
};

/// Validates a strategy document and assembles the definition.
pub fn validate(doc: &StrategyDocument) -> Result<StrategyDefinition, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = validate_name(doc, &mut errors);
    let version = validate_version(doc, &mut errors);
    let description = validate_description(doc, &mut errors);
    let mode = validate_mode(doc, &mut errors);
    let (buy, sell) = validate_conditions(doc, mode.as_ref(), &mut errors);
    let risk = validate_risk(doc, &mut errors);

    match (name, version, description, mode, buy, sell, risk) {
        (
            Some(name),
            Some(version),
            Some(description),
            Some(mode),
            Some(buy),
            Some(sell),
            Some(risk),
        ) if errors.is_empty() => Ok(StrategyDefinition {
            name,
            version,
            description,
            mode,
            buy,
            sell,
            risk,
        }),
        _ => {
            debug!(count = errors.len(), "strategy document rejected");
            Err(errors)
        }
    }
}

fn validate_name(doc: &StrategyDocument, errors: &mut Vec<ValidationError>) -> Option<String> {
    match &doc.name {
        Some(name) if !name.trim().is_empty() => Some(name.clone()),
        Some(_) => {
            errors.push(ValidationError::new("name", "must not be empty"));
            None
        }
        None => {
            errors.push(ValidationError::new("name", "is required"));
            None
        }
    }
}

fn validate_version(doc: &StrategyDocument, errors: &mut Vec<ValidationError>) -> Option<String> {
    let Some(version) = &doc.version else {
        errors.push(ValidationError::new("version", "is required"));
        return None;
    };
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if well_formed {
        Some(version.clone())
    } else {
        errors.push(ValidationError::new("version", "must match N.N.N"));
        None
    }
}

fn validate_description(
    doc: &StrategyDocument,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match &doc.description {
        Some(description) if description.chars().count() >= 10 => Some(description.clone()),
        Some(_) => {
            errors.push(ValidationError::new(
                "description",
                "must be at least 10 characters",
            ));
            None
        }
        None => {
            errors.push(ValidationError::new("description", "is required"));
            None
        }
    }
}

fn validate_mode(doc: &StrategyDocument, errors: &mut Vec<ValidationError>) -> Option<StrategyMode> {
    match (&doc.timing, &doc.indicators) {
        (Some(_), Some(_)) => {
            errors.push(ValidationError::new(
                "timing",
                "timing and indicators are mutually exclusive; provide exactly one",
            ));
            None
        }
        (None, None) => {
            errors.push(ValidationError::new(
                "timing",
                "exactly one of timing or indicators is required",
            ));
            None
        }
        (Some(timing), None) => validate_timing(timing, errors).map(StrategyMode::TimeBased),
        (None, Some(indicators)) => {
            validate_indicators(indicators, errors).map(StrategyMode::IndicatorBased)
        }
    }
}

fn validate_timing(
    timing: &TimingDocument,
    errors: &mut Vec<ValidationError>,
) -> Option<TimingSpec> {
    let reference_time = parse_time(
        timing.reference_time.as_deref(),
        "timing.reference_time",
        errors,
    );
    let signal_time = parse_time(timing.signal_time.as_deref(), "timing.signal_time", errors);
    let reference_price = match timing.reference_price.as_deref() {
        Some(name) => match PriceField::from_name(name) {
            Some(field) => Some(field),
            None => {
                errors.push(ValidationError::new(
                    "timing.reference_price",
                    "must be one of open, high, low, close",
                ));
                None
            }
        },
        None => {
            errors.push(ValidationError::new("timing.reference_price", "is required"));
            None
        }
    };

    let (reference_time, signal_time, reference_price) =
        (reference_time?, signal_time?, reference_price?);

    if signal_time <= reference_time {
        errors.push(ValidationError::new(
            "timing.signal_time",
            "must be strictly later than reference_time",
        ));
        return None;
    }

    Some(TimingSpec {
        reference_time,
        reference_price,
        signal_time,
    })
}

/// Parses a zero-padded `HH:MM` time of day.
fn parse_time(
    value: Option<&str>,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<NaiveTime> {
    let Some(text) = value else {
        errors.push(ValidationError::new(field, "is required"));
        return None;
    };
    let shaped = text.len() == 5 && text.as_bytes()[2] == b':';
    match NaiveTime::parse_from_str(text, "%H:%M") {
        Ok(time) if shaped => Some(time),
        _ => {
            errors.push(ValidationError::new(field, "must match HH:MM"));
            None
        }
    }
}

fn validate_indicators(
    docs: &[IndicatorDocument],
    errors: &mut Vec<ValidationError>,
) -> Option<Vec<IndicatorSpec>> {
    if docs.is_empty() {
        errors.push(ValidationError::new("indicators", "must not be empty"));
        return None;
    }

    let mut specs = Vec::with_capacity(docs.len());
    let mut seen: HashSet<String> = HashSet::new();
    let mut ok = true;

    for (i, doc) in docs.iter().enumerate() {
        let alias = match doc.alias.as_deref() {
            Some(alias) if !alias.trim().is_empty() => {
                if seen.insert(alias.to_string()) {
                    Some(alias.to_string())
                } else {
                    errors.push(ValidationError::new(
                        format!("indicators[{i}].alias"),
                        format!("duplicate alias '{alias}'"),
                    ));
                    None
                }
            }
            _ => {
                errors.push(ValidationError::new(
                    format!("indicators[{i}].alias"),
                    "is required",
                ));
                None
            }
        };

        let kind = validate_indicator_kind(doc, i, errors);

        match (alias, kind) {
            (Some(alias), Some(kind)) => specs.push(IndicatorSpec { kind, alias }),
            _ => ok = false,
        }
    }

    if ok { Some(specs) } else { None }
}

fn validate_indicator_kind(
    doc: &IndicatorDocument,
    index: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<IndicatorKind> {
    let field = format!("indicators[{index}].type");
    let Some(kind) = doc.kind.as_deref() else {
        errors.push(ValidationError::new(field, "is required"));
        return None;
    };

    match kind.to_ascii_lowercase().as_str() {
        "sma" => required_period(doc, index, errors).map(|period| IndicatorKind::Sma { period }),
        "ema" => required_period(doc, index, errors).map(|period| IndicatorKind::Ema { period }),
        "rsi" => required_period(doc, index, errors).map(|period| IndicatorKind::Rsi { period }),
        "macd" => {
            let fast = optional_period(
                doc.fast_period,
                format!("indicators[{index}].fast_period"),
                DEFAULT_FAST,
                errors,
            );
            let slow = optional_period(
                doc.slow_period,
                format!("indicators[{index}].slow_period"),
                DEFAULT_SLOW,
                errors,
            );
            let signal = optional_period(
                doc.signal_period,
                format!("indicators[{index}].signal_period"),
                DEFAULT_SIGNAL,
                errors,
            );
            match (fast, slow, signal) {
                (Some(fast), Some(slow), Some(signal)) => {
                    Some(IndicatorKind::Macd { fast, slow, signal })
                }
                _ => None,
            }
        }
        "stochastic" => {
            let k_period = optional_period(
                doc.k_period,
                format!("indicators[{index}].k_period"),
                DEFAULT_K_PERIOD,
                errors,
            );
            let k_smoothing = optional_period(
                doc.k_smoothing,
                format!("indicators[{index}].k_smoothing"),
                DEFAULT_K_SMOOTHING,
                errors,
            );
            let d_smoothing = optional_period(
                doc.d_smoothing,
                format!("indicators[{index}].d_smoothing"),
                DEFAULT_D_SMOOTHING,
                errors,
            );
            match (k_period, k_smoothing, d_smoothing) {
                (Some(k_period), Some(k_smoothing), Some(d_smoothing)) => {
                    Some(IndicatorKind::Stochastic {
                        k_period,
                        k_smoothing,
                        d_smoothing,
                    })
                }
                _ => None,
            }
        }
        other => {
            errors.push(ValidationError::new(
                field,
                format!("unknown indicator type '{other}'"),
            ));
            None
        }
    }
}

fn required_period(
    doc: &IndicatorDocument,
    index: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<usize> {
    let field = format!("indicators[{index}].period");
    let Some(period) = doc.period else {
        errors.push(ValidationError::new(field, "is required"));
        return None;
    };
    match as_integer_in_range(period, 1, 200) {
        Some(period) => Some(period),
        None => {
            errors.push(ValidationError::new(
                field,
                "must be an integer between 1 and 200",
            ));
            None
        }
    }
}

fn optional_period(
    value: Option<f64>,
    field: String,
    default: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<usize> {
    let Some(value) = value else {
        return Some(default);
    };
    if value.fract() != 0.0 || value < 1.0 {
        errors.push(ValidationError::new(field, "must be a positive integer"));
        return None;
    }
    Some(value as usize)
}

/// Some(n) when `value` is a whole number within [min, max].
fn as_integer_in_range(value: f64, min: usize, max: usize) -> Option<usize> {
    if value.fract() != 0.0 || value < min as f64 || value > max as f64 {
        return None;
    }
    Some(value as usize)
}

/// Identifiers a condition expression may reference under this mode.
fn variable_universe(mode: &StrategyMode) -> HashSet<String> {
    match mode {
        StrategyMode::TimeBased(_) => ["signal_price", "reference_price"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        StrategyMode::IndicatorBased(specs) => specs
            .iter()
            .flat_map(|spec| spec.kind.snapshot_keys(&spec.alias))
            .collect(),
    }
}

fn validate_conditions(
    doc: &StrategyDocument,
    mode: Option<&StrategyMode>,
    errors: &mut Vec<ValidationError>,
) -> (Option<ConditionSpec>, Option<ConditionSpec>) {
    let Some(conditions) = &doc.conditions else {
        errors.push(ValidationError::new("conditions", "is required"));
        return (None, None);
    };

    let universe = mode.map(variable_universe);

    let buy = match &conditions.buy {
        Some(condition) => {
            validate_condition(condition, "conditions.buy", mode, universe.as_ref(), errors)
        }
        None => {
            errors.push(ValidationError::new("conditions.buy", "is required"));
            None
        }
    };
    let sell = match &conditions.sell {
        Some(condition) => validate_condition(
            condition,
            "conditions.sell",
            mode,
            universe.as_ref(),
            errors,
        ),
        None => {
            errors.push(ValidationError::new("conditions.sell", "is required"));
            None
        }
    };
    (buy, sell)
}

fn validate_condition(
    condition: &ConditionDocument,
    field: &str,
    mode: Option<&StrategyMode>,
    universe: Option<&HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) -> Option<ConditionSpec> {
    match condition.kind.as_deref() {
        Some("rotation") => validate_rotation(condition, field, universe, errors),
        Some(other) => {
            errors.push(ValidationError::new(
                format!("{field}.type"),
                format!("unknown condition type '{other}'"),
            ));
            None
        }
        None => validate_simple(condition, field, mode, universe, errors),
    }
}

fn validate_simple(
    condition: &ConditionDocument,
    field: &str,
    mode: Option<&StrategyMode>,
    universe: Option<&HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) -> Option<ConditionSpec> {
    let Some(compare) = condition.compare.as_deref() else {
        errors.push(ValidationError::new(
            format!("{field}.compare"),
            "is required",
        ));
        return None;
    };

    let expr = match expr_parser::parse(compare) {
        Ok(expr) => expr,
        Err(parse_err) => {
            errors.push(ValidationError::new(
                format!("{field}.compare"),
                parse_err.to_string(),
            ));
            return None;
        }
    };

    if !expr.is_comparison() {
        errors.push(ValidationError::new(
            format!("{field}.compare"),
            "must contain a comparison operator",
        ));
        return None;
    }

    let mut ok = true;
    if let Some(universe) = universe {
        let vars = expr.variables();
        for name in &vars {
            if !universe.contains(name) {
                errors.push(ValidationError::new(
                    format!("{field}.compare"),
                    format!("unknown identifier '{name}'"),
                ));
                ok = false;
            }
        }
        match mode {
            Some(StrategyMode::TimeBased(_)) => {
                if !(vars.contains("signal_price") && vars.contains("reference_price")) {
                    errors.push(ValidationError::new(
                        format!("{field}.compare"),
                        "must reference both signal_price and reference_price",
                    ));
                    ok = false;
                }
            }
            Some(StrategyMode::IndicatorBased(_)) => {
                if vars.is_empty() {
                    errors.push(ValidationError::new(
                        format!("{field}.compare"),
                        "must reference at least one indicator alias",
                    ));
                    ok = false;
                }
            }
            None => {}
        }
    }
    if !ok {
        return None;
    }

    Some(ConditionSpec::Simple {
        expr,
        crossover: condition.crossover.unwrap_or(false),
    })
}

fn validate_rotation(
    condition: &ConditionDocument,
    field: &str,
    universe: Option<&HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) -> Option<ConditionSpec> {
    let zone = match &condition.zone {
        Some(zone) => validate_zone(zone, field, universe, errors),
        None => {
            errors.push(ValidationError::new(format!("{field}.zone"), "is required"));
            None
        }
    };
    let trigger = match &condition.trigger {
        Some(trigger) => validate_trigger(trigger, field, universe, errors),
        None => {
            errors.push(ValidationError::new(
                format!("{field}.trigger"),
                "is required",
            ));
            None
        }
    };
    match (zone, trigger) {
        (Some(zone), Some(trigger)) => Some(ConditionSpec::Rotation { zone, trigger }),
        _ => None,
    }
}

fn validate_zone(
    zone: &ZoneDocument,
    field: &str,
    universe: Option<&HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) -> Option<ZoneSpec> {
    let direction_threshold = match (zone.all_above, zone.all_below) {
        (Some(above), None) => Some((ZoneDirection::AllAbove, above)),
        (None, Some(below)) => Some((ZoneDirection::AllBelow, below)),
        (Some(_), Some(_)) => {
            errors.push(ValidationError::new(
                format!("{field}.zone"),
                "all_above and all_below are mutually exclusive",
            ));
            None
        }
        (None, None) => {
            errors.push(ValidationError::new(
                format!("{field}.zone"),
                "exactly one of all_above or all_below is required",
            ));
            None
        }
    };

    let indicators = match &zone.indicators {
        Some(list) if !list.is_empty() => {
            let mut ok = true;
            if let Some(universe) = universe {
                for alias in list {
                    if !universe.contains(alias) {
                        errors.push(ValidationError::new(
                            format!("{field}.zone.indicators"),
                            format!("unknown indicator alias '{alias}'"),
                        ));
                        ok = false;
                    }
                }
            }
            if ok { Some(list.clone()) } else { None }
        }
        _ => {
            errors.push(ValidationError::new(
                format!("{field}.zone.indicators"),
                "must not be empty",
            ));
            None
        }
    };

    let ((direction, threshold), indicators) = (direction_threshold?, indicators?);
    Some(ZoneSpec {
        direction,
        threshold,
        indicators,
    })
}

fn validate_trigger(
    trigger: &TriggerDocument,
    field: &str,
    universe: Option<&HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) -> Option<TriggerSpec> {
    let indicator = match trigger.indicator.as_deref() {
        Some(alias) if !alias.trim().is_empty() => match universe {
            Some(universe) if !universe.contains(alias) => {
                errors.push(ValidationError::new(
                    format!("{field}.trigger.indicator"),
                    format!("unknown indicator alias '{alias}'"),
                ));
                None
            }
            _ => Some(alias.to_string()),
        },
        _ => {
            errors.push(ValidationError::new(
                format!("{field}.trigger.indicator"),
                "is required",
            ));
            None
        }
    };

    let direction_threshold = match (trigger.crosses_above, trigger.crosses_below) {
        (Some(above), None) => Some((CrossDirection::CrossesAbove, above)),
        (None, Some(below)) => Some((CrossDirection::CrossesBelow, below)),
        (Some(_), Some(_)) => {
            errors.push(ValidationError::new(
                format!("{field}.trigger"),
                "crosses_above and crosses_below are mutually exclusive",
            ));
            None
        }
        (None, None) => {
            errors.push(ValidationError::new(
                format!("{field}.trigger"),
                "exactly one of crosses_above or crosses_below is required",
            ));
            None
        }
    };

    let (indicator, (direction, threshold)) = (indicator?, direction_threshold?);
    Some(TriggerSpec {
        indicator,
        direction,
        threshold,
    })
}

fn validate_risk(
    doc: &StrategyDocument,
    errors: &mut Vec<ValidationError>,
) -> Option<RiskManagement> {
    let Some(risk) = &doc.risk_management else {
        errors.push(ValidationError::new("risk_management", "is required"));
        return None;
    };

    let stop_loss = validate_pips(risk.stop_loss_pips, "risk_management.stop_loss_pips", errors);
    let take_profit = validate_pips(
        risk.take_profit_pips,
        "risk_management.take_profit_pips",
        errors,
    );

    let max_daily_trades = match risk.max_daily_trades {
        None => Some(DEFAULT_MAX_DAILY_TRADES),
        Some(value) => match as_integer_in_range(value, 1, 200) {
            Some(n) => Some(n as u32),
            None => {
                errors.push(ValidationError::new(
                    "risk_management.max_daily_trades",
                    "must be an integer between 1 and 200",
                ));
                None
            }
        },
    };

    let min_pip_distance = match risk.min_pip_distance {
        None => Some(DEFAULT_MIN_PIP_DISTANCE),
        Some(value) if value >= 0.0 => Some(value),
        Some(_) => {
            errors.push(ValidationError::new(
                "risk_management.min_pip_distance",
                "must be non-negative",
            ));
            None
        }
    };

    Some(RiskManagement {
        stop_loss_pips: stop_loss?,
        take_profit_pips: take_profit?,
        max_daily_trades: max_daily_trades?,
        min_pip_distance: min_pip_distance?,
    })
}

fn validate_pips(
    value: Option<f64>,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<f64> {
    match value {
        Some(v) if v > 0.0 && v <= 1000.0 => Some(v),
        Some(_) => {
            errors.push(ValidationError::new(
                field,
                "must be positive and at most 1000",
            ));
            None
        }
        None => {
            errors.push(ValidationError::new(field, "is required"));
            None
        }
    }
}
