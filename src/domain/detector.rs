//! Cross and zone detection over indicator values.
//!
//! Rotation conditions are edge-triggered: a trigger fires when an
//! indicator moves across a threshold between two consecutive
//! observations, not merely when it sits beyond it.

use std::collections::HashMap;

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::strategy::{ZoneDirection, ZoneSpec};

/// Tracks the previously observed value per alias so level readings can
/// be turned into cross events.
#[derive(Debug, Clone, Default)]
pub struct CrossDetector {
    last_seen: HashMap<String, f64>,
}

impl CrossDetector {
    pub fn new() -> Self {
        Self {
            last_seen: HashMap::new(),
        }
    }

    /// True when `alias` moved from at-or-below `threshold` to above it.
    ///
    /// The first observation of an alias never fires.
    pub fn cross_above(&self, alias: &str, current: f64, threshold: f64) -> bool {
        match self.last_seen.get(alias) {
            Some(&previous) => previous <= threshold && current > threshold,
            None => false,
        }
    }

    /// True when `alias` moved from at-or-above `threshold` to below it.
    ///
    /// The first observation of an alias never fires.
    pub fn cross_below(&self, alias: &str, current: f64, threshold: f64) -> bool {
        match self.last_seen.get(alias) {
            Some(&previous) => previous >= threshold && current < threshold,
            None => false,
        }
    }

    /// Records `value` as the most recent observation for `alias`.
    pub fn observe(&mut self, alias: &str, value: f64) {
        self.last_seen.insert(alias.to_string(), value);
    }

    /// Forgets all observations, as if no value had ever been seen.
    pub fn reset(&mut self) {
        self.last_seen.clear();
    }
}

/// True when every indicator the zone names satisfies its bound in
/// `snapshot`. An alias missing from the snapshot fails the zone.
pub fn zone_holds(zone: &ZoneSpec, snapshot: &IndicatorSnapshot) -> bool {
    zone.indicators
        .iter()
        .all(|alias| match snapshot.get(alias) {
            Some(value) => match zone.direction {
                ZoneDirection::AllAbove => value > zone.threshold,
                ZoneDirection::AllBelow => value < zone.threshold,
            },
            None => false,
        })
}
