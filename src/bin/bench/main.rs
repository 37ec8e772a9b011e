// Crash Benchmark Runner v1.0.0 — Fairness Validation
// Monte Carlo (N=30), seedable PRNG, per-round audit trail
//
// Usage:
//   cargo run --release --bin bench                     # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5         # Quick mode (5 runs each)
//   cargo run --release --bin bench -- --rounds 1000    # Override rounds per run
//   cargo run --release --bin bench -- AUTO_2X          # Filter by name
//   cargo run --release --bin bench -- --time-series    # Enable JSONL output
//   cargo run --release --bin bench -- --seed 42        # Custom base seed

mod metrics;
mod monte_carlo;
mod report;
mod scenarios;
mod time_series;

use report::*;
use scenarios::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A scenario passes when at least 28 of 30 runs pass.
const PASS_THRESHOLD: f64 = 0.933;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    rounds: Option<u64>,
    time_series: bool,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 30,
        seed: 0,
        rounds: None,
        time_series: false,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30).max(1);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--rounds" => {
                i += 1;
                if i < args.len() {
                    cli.rounds = args[i].parse().ok().filter(|&r: &u64| r > 0);
                }
            }
            "--time-series" => {
                cli.time_series = true;
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn verdict(ok: bool) -> &'static str {
    if ok { "PASS" } else { "FAIL" }
}

// ─── Fairness Checks ────────────────────────────────────────────────────────

/// Pooled instant-crash rate of every run, against `edge / 100`.
fn instant_rate_matches(report: &MonteCarloReport) -> bool {
    let p = report.house_edge / 100.0;
    let pooled_rounds = (report.rounds_per_run as f64 * report.n_runs as f64).max(1.0);
    let stderr = (p * (1.0 - p) / pooled_rounds).sqrt();
    (report.instant_crash_rate.mean - p).abs() <= 4.5 * stderr + 1e-12
}

/// Same seeds, same crash points: an auto target must settle identically
/// whatever the frame length.
fn coarse_frames_match(reports: &[MonteCarloReport]) -> bool {
    let fine = reports.iter().find(|r| r.scenario_name == "AUTO_2X_EDGE_1");
    let coarse = reports.iter().find(|r| r.scenario_name == "AUTO_2X_COARSE_FRAMES");
    match (fine, coarse) {
        (Some(fine), Some(coarse)) => fine
            .individual_runs
            .iter()
            .zip(&coarse.individual_runs)
            .all(|(a, b)| a.seed == b.seed && a.paid_out == b.paid_out && a.wins == b.wins),
        _ => true,
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let ts_dir = if cli.time_series {
        Some(std::path::Path::new("benchmark-results/time-series").to_path_buf())
    } else {
        None
    };

    println!("\n  Crash Benchmark Runner v1.0.0");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<32} {:>5} {:>14} {:>8} {:>7} {:>7} {:>6} {:>7}",
        "Scenario", "Pass%", "RTP", "Theory", "TailZ", "Inst%", "T/O", "Time");
    println!("  {}", "-".repeat(96));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = monte_carlo::run_monte_carlo(
            scenario,
            cli.runs,
            cli.seed,
            cli.rounds,
            ts_dir.as_deref(),
        );

        let pass_pct = report.pass_rate * 100.0;
        let rtp_ci = (report.empirical_rtp.ci_upper - report.empirical_rtp.ci_lower) / 2.0;
        let theory = report
            .theoretical_rtp
            .map_or_else(|| "-".to_string(), |t| format!("{:.4}", t));

        println!("  {:<32} {:>4}% {:>7.4}±{:<6.4} {:>8} {:>7.2} {:>6.2}% {:>6.0} {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.empirical_rtp.mean, rtp_ci,
            theory,
            report.max_tail_z.max,
            report.instant_crash_rate.mean * 100.0,
            report.timeouts.mean,
            report.elapsed_ms.mean,
            verdict(report.pass_rate >= PASS_THRESHOLD),
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Fairness Validation ────────────────────────────────────────────

    let fixed_target: Vec<&MonteCarloReport> = mc_reports.iter()
        .filter(|r| r.theoretical_rtp.is_some())
        .collect();

    let validation = FairnessValidation {
        rtp_matches_theory: fixed_target.iter()
            .all(|r| r.pass_rate >= PASS_THRESHOLD),
        tail_matches_theory: mc_reports.iter().all(|r| {
            let within = r.individual_runs.iter().filter(|run| run.max_tail_z <= 4.5).count();
            within as f64 / r.n_runs.max(1) as f64 >= PASS_THRESHOLD
        }),
        instant_crash_rate_matches_edge: mc_reports.iter().all(instant_rate_matches),
        coarse_frames_settle_identically: coarse_frames_match(&mc_reports),
        zero_conservation_violations: mc_reports.iter().all(|r| r.conservation_violations == 0),
    };

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= PASS_THRESHOLD).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(96));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    println!("  Fairness Validation:");
    println!("    RTP = closed form:        {}", verdict(validation.rtp_matches_theory));
    println!("    Crash tail = survival:    {}", verdict(validation.tail_matches_theory));
    println!("    Instant rate = edge:      {}", verdict(validation.instant_crash_rate_matches_edge));
    println!("    Frame-rate independent:   {}", verdict(validation.coarse_frames_settle_identically));
    println!("    Balance conserved:        {}\n", verdict(validation.zero_conservation_violations));

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let timestamp = format!("{}", ts);
    let all_valid = validation.all_pass();

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: "1.0.0",
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        rounds_override: cli.rounds,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        fairness_validation: validation,
        scenarios: mc_reports,
    };

    let dir = std::path::Path::new("benchmark-results");
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("  Failed to create benchmark-results/: {}", e);
        std::process::exit(1);
    }
    let path = dir.join(format!("bench-{}.json", timestamp));
    match serde_json::to_string_pretty(&report) {
        Ok(json) => match std::fs::write(&path, json) {
            Ok(()) => println!("  Results saved to: {}\n", path.display()),
            Err(e) => eprintln!("  Failed to write benchmark file: {}", e),
        },
        Err(e) => eprintln!("  Failed to serialize report: {}", e),
    }

    if failed > 0 || !all_valid {
        std::process::exit(1);
    }
}
