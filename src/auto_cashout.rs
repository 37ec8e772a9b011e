// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Auto-Cashout Arbitration

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Lowest auto-cashout target a player may configure.
pub const MIN_AUTO_CASHOUT_TARGET: f64 = 1.01;

/// Target used before the player configures one.
pub const DEFAULT_AUTO_CASHOUT_TARGET: f64 = 2.00;

/// Player's standing auto-cashout instruction. Edited between rounds only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoCashoutConfig {
    pub enabled: bool,
    pub target: f64,
}

impl Default for AutoCashoutConfig {
    fn default() -> Self {
        Self { enabled: false, target: DEFAULT_AUTO_CASHOUT_TARGET }
    }
}

impl AutoCashoutConfig {
    /// Replace the target. A target below 1.01x (or NaN) is rejected and the
    /// previous target kept.
    pub fn set_target(&mut self, target: f64) -> Result<(), EngineError> {
        if !(target >= MIN_AUTO_CASHOUT_TARGET) || !target.is_finite() {
            return Err(EngineError::InvalidAutoCashoutTarget(target));
        }
        self.target = target;
        Ok(())
    }
}

/// Whether the configured target has been reached at true multiplier `now`.
pub fn should_trigger(config: &AutoCashoutConfig, now: f64) -> bool {
    config.enabled && config.target >= MIN_AUTO_CASHOUT_TARGET && now >= config.target
}
