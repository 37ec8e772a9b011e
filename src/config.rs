// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Table Configuration

use serde::{Deserialize, Serialize};

use crate::clock::MultiplierClock;
use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Default house edge, in percent.
pub const DEFAULT_HOUSE_EDGE_PERCENT: f64 = 1.0;

/// Safety cap on round length (100 minutes).
pub const DEFAULT_MAX_ROUND_DURATION_MS: f64 = 6_000_000.0;

/// Per-table settings. Every field defaults, so hosts may pass a partial
/// object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub house_edge_percent: f64,
    pub max_round_duration_ms: f64,
    pub history_capacity: usize,
    pub clock: MultiplierClock,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            house_edge_percent: DEFAULT_HOUSE_EDGE_PERCENT,
            max_round_duration_ms: DEFAULT_MAX_ROUND_DURATION_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            clock: MultiplierClock::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..100.0).contains(&self.house_edge_percent) {
            return Err(ConfigError::InvalidHouseEdge(self.house_edge_percent));
        }
        if !self.max_round_duration_ms.is_finite() || self.max_round_duration_ms <= 0.0 {
            return Err(ConfigError::InvalidRoundDuration(self.max_round_duration_ms));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidHistoryCapacity);
        }
        if !self.clock.is_valid() {
            return Err(ConfigError::InvalidClock {
                growth_rate: self.clock.growth_rate,
                exponent: self.clock.exponent,
            });
        }
        Ok(())
    }

    pub fn with_house_edge(mut self, percent: f64) -> Self {
        self.house_edge_percent = percent;
        self
    }

    pub fn with_max_round_duration_ms(mut self, ms: f64) -> Self {
        self.max_round_duration_ms = ms;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_clock(mut self, clock: MultiplierClock) -> Self {
        self.clock = clock;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_round_duration_ms, 6_000_000.0);
        assert_eq!(cfg.history_capacity, 5);
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = EngineConfig::default();
        assert_eq!(
            base.with_house_edge(100.0).validate(),
            Err(ConfigError::InvalidHouseEdge(100.0))
        );
        assert!(base.with_house_edge(-1.0).validate().is_err());
        assert!(base.with_house_edge(f64::NAN).validate().is_err());
        assert!(base.with_max_round_duration_ms(0.0).validate().is_err());
        assert_eq!(
            base.with_history_capacity(0).validate(),
            Err(ConfigError::InvalidHistoryCapacity)
        );
        assert!(base
            .with_clock(MultiplierClock::new(-0.06, 1.65))
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"house_edge_percent": 4.0}"#).unwrap();
        assert_eq!(cfg.house_edge_percent, 4.0);
        assert_eq!(cfg.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(cfg.clock, MultiplierClock::default());
    }
}
