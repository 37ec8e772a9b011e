// Crash Benchmark Report Types
// Structured output for independent analysis and fairness validation

use serde::Serialize;

use crate::metrics::TailPoint;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub name: String,
    pub category: String,
    pub seed: u64,
    pub pass: bool,
    pub rounds: u64,
    pub wins: u64,
    pub losses: u64,
    pub wagered: u64,
    pub paid_out: u64,
    pub empirical_rtp: f64,
    pub theoretical_rtp: Option<f64>,
    pub rtp_z: Option<f64>,
    pub tail: Vec<TailPoint>,
    pub max_tail_z: f64,
    pub instant_crashes: u64,
    pub instant_crash_rate: f64,
    pub timeouts: u64,
    pub forced_ends: u64,
    pub max_crash_point: f64,
    pub conservation_holds: bool,
    pub conservation_violations: u32,
    pub frames: u64,
    pub elapsed_ms: u128,
    pub rounds_per_sec: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub house_edge: f64,
    pub n_runs: usize,
    pub rounds_per_run: u64,
    pub pass_rate: f64,
    pub empirical_rtp: Stats,
    pub theoretical_rtp: Option<f64>,
    pub rtp_z: Stats,
    pub max_tail_z: Stats,
    pub instant_crash_rate: Stats,
    pub timeouts: Stats,
    pub frames_per_round: Stats,
    pub elapsed_ms: Stats,
    pub rounds_per_sec: Stats,
    pub conservation_violations: u32,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Fairness Validation Summary ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FairnessValidation {
    /// Every fixed-target scenario lands on its closed-form RTP.
    pub rtp_matches_theory: bool,
    /// Crash tails match the survival function at every checkpoint.
    pub tail_matches_theory: bool,
    /// Instant-crash rate sits on the house edge.
    pub instant_crash_rate_matches_edge: bool,
    /// Settlement is frame-rate independent.
    pub coarse_frames_settle_identically: bool,
    /// No run ever lost or minted a unit of balance.
    pub zero_conservation_violations: bool,
}

impl FairnessValidation {
    pub fn all_pass(&self) -> bool {
        self.rtp_matches_theory
            && self.tail_matches_theory
            && self.instant_crash_rate_matches_edge
            && self.coarse_frames_settle_identically
            && self.zero_conservation_violations
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub rounds_override: Option<u64>,
    pub summary: Summary,
    pub fairness_validation: FairnessValidation,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}
