// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Multiplier Clock

use serde::{Deserialize, Serialize};

/// Reference growth rate `k`.
pub const DEFAULT_GROWTH_RATE: f64 = 0.06;

/// Reference exponent `p`.
pub const DEFAULT_EXPONENT: f64 = 1.65;

/// Maps elapsed round time to the authoritative multiplier `1 + k * t^p`.
///
/// This is the only value settlement and crash detection read. Anything shown
/// to the player that differs from it is presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierClock {
    pub growth_rate: f64,
    pub exponent: f64,
}

impl Default for MultiplierClock {
    fn default() -> Self {
        Self { growth_rate: DEFAULT_GROWTH_RATE, exponent: DEFAULT_EXPONENT }
    }
}

impl MultiplierClock {
    pub fn new(growth_rate: f64, exponent: f64) -> Self {
        Self { growth_rate, exponent }
    }

    /// True multiplier after `elapsed_secs`. Negative time counts as zero.
    pub fn true_multiplier(&self, elapsed_secs: f64) -> f64 {
        let t = if elapsed_secs.is_nan() { 0.0 } else { elapsed_secs.max(0.0) };
        1.0 + self.growth_rate * t.powf(self.exponent)
    }

    /// Seconds needed for the multiplier to reach `multiplier`.
    pub fn elapsed_for(&self, multiplier: f64) -> f64 {
        if multiplier <= 1.0 {
            return 0.0;
        }
        ((multiplier - 1.0) / self.growth_rate).powf(1.0 / self.exponent)
    }

    pub fn is_valid(&self) -> bool {
        self.growth_rate.is_finite()
            && self.exponent.is_finite()
            && self.growth_rate > 0.0
            && self.exponent > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_one() {
        let clock = MultiplierClock::default();
        assert_eq!(clock.true_multiplier(0.0), 1.00);
        assert_eq!(clock.true_multiplier(-3.0), 1.00);
    }

    #[test]
    fn test_reference_curve() {
        let clock = MultiplierClock::default();
        // 1 + 0.06 * 10^1.65 ≈ 3.6835
        let m = clock.true_multiplier(10.0);
        assert!((m - (1.0 + 0.06 * 10f64.powf(1.65))).abs() < 1e-12);
        assert!(m > 3.6 && m < 3.7, "m = {}", m);
    }

    #[test]
    fn test_elapsed_for_inverts() {
        let clock = MultiplierClock::default();
        for &target in &[1.01, 1.5, 2.0, 10.0, 1000.0] {
            let t = clock.elapsed_for(target);
            assert!((clock.true_multiplier(t) - target).abs() < 1e-9, "target {}", target);
        }
        assert_eq!(clock.elapsed_for(1.0), 0.0);
    }

    #[test]
    fn test_validity() {
        assert!(MultiplierClock::default().is_valid());
        assert!(!MultiplierClock::new(0.0, 1.65).is_valid());
        assert!(!MultiplierClock::new(0.06, f64::NAN).is_valid());
    }

    proptest! {
        #[test]
        fn prop_strictly_increasing(t1 in 0.0001f64..10_000.0, dt in 0.0001f64..10_000.0) {
            let clock = MultiplierClock::default();
            let t2 = t1 + dt;
            prop_assert!(clock.true_multiplier(t1) < clock.true_multiplier(t2));
        }

        #[test]
        fn prop_above_one_after_start(t in 0.0001f64..1_000_000.0) {
            prop_assert!(MultiplierClock::default().true_multiplier(t) > 1.0);
        }
    }
}
