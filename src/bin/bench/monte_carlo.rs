// Monte Carlo Infrastructure — N runs per scenario with statistical aggregation
// Each run plays full rounds through the engine tick loop with seed base+i

use crash_engine::crash_point;
use crash_engine::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::metrics::{ConservationTracker, ReturnTracker, TailTracker};
use crate::report::*;
use crate::scenarios::{Scenario, Strategy};
use crate::time_series::{RoundSnapshot, TimeSeriesRecorder};

use std::time::Instant;

/// Offset separating the strategy stream from the engine stream.
const STRATEGY_STREAM: u64 = 0x5eed_cafe;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    rounds: u64,
    seed: u64,
    time_series_dir: Option<&std::path::Path>,
) -> BenchResult {
    let start = Instant::now();

    let config = EngineConfig::default()
        .with_house_edge(scenario.house_edge)
        .with_max_round_duration_ms(scenario.max_round_duration_ms);
    // Enough to cover every stake even if every round loses
    let initial_balance = scenario.stake.saturating_mul(rounds).saturating_add(1);
    let mut engine = match CrashEngine::new(
        config,
        ChaChaSource::seeded(seed),
        LocalWallet::new(initial_balance),
    ) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("  Error: scenario {} has an invalid config: {}", scenario.name, e);
            std::process::exit(2);
        }
    };
    let mut strategy_rng = ChaCha8Rng::seed_from_u64(seed ^ STRATEGY_STREAM);

    if let Strategy::Auto(target) = scenario.strategy {
        if let Err(e) = engine.configure_auto_cashout(target) {
            eprintln!("  Error: scenario {} auto target rejected: {}", scenario.name, e);
            std::process::exit(2);
        }
    }
    if matches!(scenario.strategy, Strategy::Auto(_) | Strategy::RandomAuto { .. }) {
        if let Err(e) = engine.enable_auto_cashout() {
            eprintln!("  Error: scenario {} could not enable auto-cashout: {}", scenario.name, e);
            std::process::exit(2);
        }
    }

    let mut tail = TailTracker::new(scenario.house_edge);
    let mut returns = ReturnTracker::new();
    let mut conservation = ConservationTracker::new(initial_balance);
    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());

    let mut now_ms = 0.0_f64;
    let mut frames: u64 = 0;
    let mut timeouts: u64 = 0;
    let mut forced_ends: u64 = 0;
    let mut played: u64 = 0;

    for _ in 0..rounds {
        let expected = match scenario.strategy {
            Strategy::RandomAuto { lo, hi } => {
                let raw = lo + strategy_rng.gen::<f64>() * (hi - lo);
                let target = (raw * 100.0).floor() / 100.0;
                match engine.configure_auto_cashout(target) {
                    Ok(()) => Some(crash_point::theoretical_rtp(scenario.house_edge, target)),
                    Err(_) => None,
                }
            }
            other => other.theoretical_rtp(scenario.house_edge),
        };

        if let Err(e) = engine.place_bet(scenario.stake) {
            eprintln!("  Warning: bet rejected in {} (seed {}): {}", scenario.name, seed, e);
            break;
        }

        let mut round_frames: u64 = 0;
        let outcome = loop {
            now_ms += scenario.frame_ms;
            round_frames += 1;
            if let Some(outcome) = engine.tick(now_ms) {
                break outcome;
            }
            if let Strategy::Manual(threshold) = scenario.strategy {
                let holding = engine.snapshot().bet.map_or(false, |b| !b.cashed_out);
                if holding && engine.true_multiplier() >= threshold {
                    // The round is Running and the bet unclaimed, so this must settle
                    if let Err(e) = engine.cash_out() {
                        eprintln!("  Error: cashout rejected in {} (seed {}): {}", scenario.name, seed, e);
                        std::process::exit(2);
                    }
                }
            }
        };
        frames += round_frames;
        played += 1;

        match outcome.end_reason {
            EndReason::TimedOut => timeouts += 1,
            EndReason::Forced => forced_ends += 1,
            EndReason::Crashed => {}
        }

        tail.record(outcome.crash_point);
        returns.record(&outcome, expected);
        let balance = engine.wallet().balance();
        conservation.record_round(balance, engine.stats().net());

        if let Some(ref mut ts) = time_series {
            ts.record(RoundSnapshot::from_outcome(&outcome, balance, engine.stats().rtp(), round_frames));
        }
    }

    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = ts.write_jsonl(&path) {
            eprintln!("  Warning: failed to write time series: {}", e);
        }
    }

    let elapsed = start.elapsed();
    let elapsed_secs = elapsed.as_secs_f64().max(0.001);
    let stats = *engine.stats();
    let rtp_z = returns.z();
    let max_tail_z = tail.max_z();

    let criteria = &scenario.criteria;
    let mut pass = played == rounds;
    if let Some(z) = rtp_z {
        if z > criteria.max_rtp_z {
            pass = false;
        }
    }
    if max_tail_z > criteria.max_tail_z {
        pass = false;
    }
    if criteria.require_conservation && !conservation.holds() {
        pass = false;
    }
    if let Some(max_instant) = criteria.max_instant_crashes {
        if tail.instant_crashes > max_instant {
            pass = false;
        }
    }
    if criteria.expect_timeouts && timeouts == 0 {
        pass = false;
    }

    BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass,
        rounds: played,
        wins: stats.wins,
        losses: stats.losses,
        wagered: stats.wagered,
        paid_out: stats.paid_out,
        empirical_rtp: returns.empirical_rtp(),
        theoretical_rtp: returns.theoretical_rtp(),
        rtp_z,
        tail: tail.points(),
        max_tail_z,
        instant_crashes: tail.instant_crashes,
        instant_crash_rate: tail.instant_crashes as f64 / played.max(1) as f64,
        timeouts,
        forced_ends,
        max_crash_point: tail.max_crash_point,
        conservation_holds: conservation.holds(),
        conservation_violations: conservation.violations,
        frames,
        elapsed_ms: elapsed.as_millis(),
        rounds_per_sec: played as f64 / elapsed_secs,
    }
}

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    rounds_override: Option<u64>,
    time_series_base: Option<&std::path::Path>,
) -> MonteCarloReport {
    let rounds = rounds_override.unwrap_or(scenario.rounds);
    let ts_dir = time_series_base.map(|base| base.join(scenario.name.to_lowercase()));

    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        results.push(run_single(scenario, rounds, seed, ts_dir.as_deref()));
    }

    aggregate(scenario, rounds, results)
}

fn aggregate(scenario: &Scenario, rounds: u64, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let pass_rate = if n == 0 { 0.0 } else { passed as f64 / n as f64 };

    let collect = |f: &dyn Fn(&BenchResult) -> f64| -> Stats {
        Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
    };

    let theoretical_rtp = {
        let samples: Vec<f64> = results.iter().filter_map(|r| r.theoretical_rtp).collect();
        if samples.is_empty() || samples.len() != n {
            None
        } else {
            Some(samples.iter().sum::<f64>() / n as f64)
        }
    };

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        house_edge: scenario.house_edge,
        n_runs: n,
        rounds_per_run: rounds,
        pass_rate,
        empirical_rtp: collect(&|r| r.empirical_rtp),
        theoretical_rtp,
        rtp_z: collect(&|r| r.rtp_z.unwrap_or(0.0)),
        max_tail_z: collect(&|r| r.max_tail_z),
        instant_crash_rate: collect(&|r| r.instant_crash_rate),
        timeouts: collect(&|r| r.timeouts as f64),
        frames_per_round: collect(&|r| r.frames as f64 / r.rounds.max(1) as f64),
        elapsed_ms: collect(&|r| r.elapsed_ms as f64),
        rounds_per_sec: collect(&|r| r.rounds_per_sec),
        conservation_violations: results.iter().map(|r| r.conservation_violations).sum(),
        individual_runs: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::scenarios;

    fn scenario(name: &str) -> Scenario {
        scenarios()
            .into_iter()
            .find(|s| s.name == name)
            .expect("scenario exists")
    }

    #[test]
    fn test_manual_strategy_cashes_out_and_conserves() {
        let result = run_single(&scenario("MANUAL_2X_EDGE_1"), 300, 7, None);
        assert_eq!(result.rounds, 300);
        assert!(result.wins > 0);
        assert_eq!(result.wins + result.losses, 300);
        assert!(result.conservation_holds);
    }

    #[test]
    fn test_auto_strategy_pays_exactly_target() {
        let result = run_single(&scenario("AUTO_2X_EDGE_1"), 300, 7, None);
        assert_eq!(result.rounds, 300);
        assert!(result.wins > 0);
        assert_eq!(result.paid_out, result.wins * 200);
        assert!(result.conservation_holds);
    }
}
