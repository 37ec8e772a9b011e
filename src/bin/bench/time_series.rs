// Per-Round JSONL Time Series Recorder
// One JSON line per settled round for independent analysis

use crash_engine::{EndReason, RoundOutcome};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct RoundSnapshot {
    pub round_id: u64,
    pub end_reason: EndReason,
    pub crash_point: f64,
    pub final_multiplier: f64,
    pub stake: u64,
    pub cashout_multiplier: Option<f64>,
    pub payout: u64,
    pub profit: i64,
    pub balance: u64,
    pub cumulative_rtp: f64,
    pub frames: u64,
}

impl RoundSnapshot {
    pub fn from_outcome(outcome: &RoundOutcome, balance: u64, cumulative_rtp: f64, frames: u64) -> Self {
        Self {
            round_id: outcome.round_id,
            end_reason: outcome.end_reason,
            crash_point: outcome.crash_point,
            final_multiplier: outcome.final_multiplier,
            stake: outcome.stake,
            cashout_multiplier: outcome.cashout_multiplier,
            payout: outcome.payout,
            profit: outcome.profit,
            balance,
            cumulative_rtp,
            frames,
        }
    }
}

pub struct TimeSeriesRecorder {
    snapshots: Vec<RoundSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, snapshot: RoundSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}
