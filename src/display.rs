// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Displayed Multiplier
//
// Presentation only. The smoother reads the true multiplier and produces the
// number a host may draw; nothing here is ever read back by the engine.

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayParams {
    /// Exponential catch-up rate toward the true value, per second.
    pub catch_up_rate: f64,
    /// Peak jitter as a fraction of the gain above 1.00x.
    pub jitter: f64,
    /// Largest fraction the displayed value may run ahead of the true value.
    pub max_overshoot: f64,
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self { catch_up_rate: 6.0, jitter: 0.015, max_overshoot: 0.01 }
    }
}

/// Lagging, slightly jittery rendition of the true multiplier.
#[derive(Debug, Clone)]
pub struct DisplaySmoother<R: RandomSource> {
    params: DisplayParams,
    rand: R,
    displayed: f64,
}

impl<R: RandomSource> DisplaySmoother<R> {
    pub fn new(params: DisplayParams, rand: R) -> Self {
        Self { params, rand, displayed: 1.0 }
    }

    /// Move toward `true_multiplier` after `dt_secs` of wall time.
    pub fn update(&mut self, true_multiplier: f64, dt_secs: f64) -> f64 {
        let dt = dt_secs.max(0.0);
        let alpha = 1.0 - (-self.params.catch_up_rate * dt).exp();
        let eased = self.displayed + (true_multiplier - self.displayed) * alpha;

        let gain = (true_multiplier - 1.0).max(0.0);
        let wobble = (self.rand.next() * 2.0 - 1.0) * self.params.jitter * gain;

        let ceiling = true_multiplier * (1.0 + self.params.max_overshoot);
        self.displayed = (eased + wobble).clamp(1.0, ceiling.max(1.0));
        self.displayed
    }

    /// Snap to the final multiplier once the round has crashed.
    pub fn settle(&mut self, final_multiplier: f64) -> f64 {
        self.displayed = final_multiplier.max(1.0);
        self.displayed
    }

    pub fn reset(&mut self) {
        self.displayed = 1.0;
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MultiplierClock;
    use crate::random::{ChaChaSource, ScriptedSource};

    #[test]
    fn test_tracks_true_value_within_bounds() {
        let clock = MultiplierClock::default();
        let params = DisplayParams::default();
        let mut smoother = DisplaySmoother::new(params, ChaChaSource::seeded(3));
        let dt = 1.0 / 60.0;
        for frame in 1..=600 {
            let truth = clock.true_multiplier(frame as f64 * dt);
            let shown = smoother.update(truth, dt);
            assert!(shown >= 1.0);
            assert!(shown <= truth * (1.0 + params.max_overshoot) + 1e-12);
        }
        let truth = clock.true_multiplier(10.0);
        assert!((smoother.displayed() - truth).abs() / truth < 0.1);
    }

    #[test]
    fn test_lags_without_jitter() {
        let params = DisplayParams { jitter: 0.0, ..DisplayParams::default() };
        let mut smoother = DisplaySmoother::new(params, ScriptedSource::new([0.5]));
        let shown = smoother.update(2.0, 0.05);
        assert!(shown > 1.0 && shown < 2.0, "shown = {}", shown);
    }

    #[test]
    fn test_settle_snaps_to_final() {
        let mut smoother = DisplaySmoother::new(DisplayParams::default(), ScriptedSource::default());
        smoother.update(3.0, 0.01);
        assert_eq!(smoother.settle(2.47), 2.47);
        smoother.reset();
        assert_eq!(smoother.displayed(), 1.0);
    }
}
