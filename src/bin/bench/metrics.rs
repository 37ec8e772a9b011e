// Per-Round Metric Trackers — Crash Tail, Return To Player, Conservation
// Empirical distributions checked against the closed-form crash tail

use crash_engine::{crash_point, RoundOutcome};
use serde::Serialize;

/// Multipliers at which the survival function is sampled.
pub const TAIL_CHECKPOINTS: [f64; 4] = [1.01, 2.0, 10.0, 100.0];

// ─── Crash Tail Tracker ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TailPoint {
    pub multiplier: f64,
    pub empirical: f64,
    pub theoretical: f64,
    /// |empirical - theoretical| in binomial standard errors.
    pub z: f64,
}

/// Counts crash points at or above each checkpoint.
pub struct TailTracker {
    house_edge: f64,
    rounds: u64,
    at_or_above: [u64; TAIL_CHECKPOINTS.len()],
    pub instant_crashes: u64,
    pub max_crash_point: f64,
}

impl TailTracker {
    pub fn new(house_edge: f64) -> Self {
        Self {
            house_edge,
            rounds: 0,
            at_or_above: [0; TAIL_CHECKPOINTS.len()],
            instant_crashes: 0,
            max_crash_point: 0.0,
        }
    }

    pub fn record(&mut self, crash_point: f64) {
        self.rounds += 1;
        for (count, m) in self.at_or_above.iter_mut().zip(TAIL_CHECKPOINTS) {
            if crash_point >= m {
                *count += 1;
            }
        }
        if crash_point <= crash_point::INSTANT_CRASH {
            self.instant_crashes += 1;
        }
        self.max_crash_point = self.max_crash_point.max(crash_point);
    }

    pub fn points(&self) -> Vec<TailPoint> {
        let n = self.rounds.max(1) as f64;
        TAIL_CHECKPOINTS
            .iter()
            .zip(self.at_or_above)
            .map(|(&m, count)| {
                let theoretical = crash_point::survival_probability(self.house_edge, m);
                let empirical = count as f64 / n;
                let stderr = (theoretical * (1.0 - theoretical) / n).sqrt();
                let diff = (empirical - theoretical).abs();
                let z = if stderr > 0.0 {
                    diff / stderr
                } else if diff > 0.0 {
                    f64::INFINITY
                } else {
                    0.0
                };
                TailPoint { multiplier: m, empirical, theoretical, z }
            })
            .collect()
    }

    /// Largest deviation across checkpoints, in standard errors.
    pub fn max_z(&self) -> f64 {
        self.points().iter().map(|p| p.z).fold(0.0, f64::max)
    }
}

// ─── Return Tracker ─────────────────────────────────────────────────────────

/// Per-round returns (`payout / stake`) alongside their expected value.
pub struct ReturnTracker {
    returns: Vec<f64>,
    expected: Vec<f64>,
}

impl ReturnTracker {
    pub fn new() -> Self {
        Self { returns: Vec::new(), expected: Vec::new() }
    }

    /// `expected` is `None` when the strategy has no closed form.
    pub fn record(&mut self, outcome: &RoundOutcome, expected: Option<f64>) {
        if outcome.stake == 0 {
            return;
        }
        self.returns.push(outcome.payout as f64 / outcome.stake as f64);
        if let Some(e) = expected {
            self.expected.push(e);
        }
    }

    pub fn empirical_rtp(&self) -> f64 {
        mean(&self.returns)
    }

    /// Mean of the per-round expectations, when every round had one.
    pub fn theoretical_rtp(&self) -> Option<f64> {
        if self.expected.is_empty() || self.expected.len() != self.returns.len() {
            return None;
        }
        Some(mean(&self.expected))
    }

    /// |empirical - theoretical| in standard errors of the mean return.
    pub fn z(&self) -> Option<f64> {
        let theoretical = self.theoretical_rtp()?;
        let n = self.returns.len();
        if n < 2 {
            return None;
        }
        let m = self.empirical_rtp();
        let var = self.returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (n - 1) as f64;
        let stderr = (var / n as f64).sqrt();
        let diff = (m - theoretical).abs();
        Some(if stderr > 0.0 { diff / stderr } else if diff > 1e-12 { f64::INFINITY } else { 0.0 })
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

// ─── Conservation Tracker ───────────────────────────────────────────────────

/// Balance must equal the opening balance plus the player's net, every round.
pub struct ConservationTracker {
    initial_balance: u64,
    pub violations: u32,
    pub max_abs_error: i128,
}

impl ConservationTracker {
    pub fn new(initial_balance: u64) -> Self {
        Self { initial_balance, violations: 0, max_abs_error: 0 }
    }

    pub fn record_round(&mut self, balance: u64, net: i64) {
        let expected = self.initial_balance as i128 + net as i128;
        let error = (balance as i128 - expected).abs();
        if error != 0 {
            self.violations += 1;
        }
        self.max_abs_error = self.max_abs_error.max(error);
    }

    pub fn holds(&self) -> bool {
        self.violations == 0
    }
}
