// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Type Definitions

use serde::{Deserialize, Serialize};

use crate::auto_cashout::AutoCashoutConfig;

// ─── Phase ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle = 0,
    Betting = 1,
    Running = 2,
    Crashed = 3,
}

impl Phase {
    /// A round is in flight from bet acceptance until the crash fires.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Betting | Self::Running)
    }
}

// ─── End Reason ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EndReason {
    /// The true multiplier reached the drawn crash target.
    Crashed = 0,
    /// The round hit the max duration safety cap.
    TimedOut = 1,
    /// Administrative fast-forward (skip control, host going inactive).
    Forced = 2,
}

// ─── Receipts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BetReceipt {
    pub round_id: u64,
    pub stake: u64,
    pub balance_after: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CashoutReceipt {
    pub round_id: u64,
    pub multiplier: f64,
    pub payout: u64,
    pub profit: i64,
    /// True when the cashout was triggered by the auto-cashout target.
    pub automatic: bool,
}

// ─── Round Outcome ───────────────────────────────────────────────────────────

/// Emitted once per round, on the tick (or forced end) that crashes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundOutcome {
    pub round_id: u64,
    pub end_reason: EndReason,
    /// The drawn crash target, revealed now that the round is over.
    pub crash_point: f64,
    /// Multiplier recorded to history for this round.
    pub final_multiplier: f64,
    pub stake: u64,
    pub cashout_multiplier: Option<f64>,
    pub payout: u64,
    pub profit: i64,
    pub ended_at_ms: f64,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BetView {
    pub stake: u64,
    pub cashed_out: bool,
    pub cashout_multiplier: Option<f64>,
    pub payout: u64,
}

/// Read-only view for presentation. Never carries the crash target of a
/// round that has not ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSnapshot {
    pub round_id: u64,
    pub phase: Phase,
    pub true_multiplier: f64,
    pub crashed_at: Option<f64>,
    pub bet: Option<BetView>,
    pub auto_cashout: AutoCashoutConfig,
    pub balance: u64,
}
