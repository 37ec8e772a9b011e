// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Error Types

use serde::Serialize;

use crate::types::Phase;

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Rejections surfaced by the round controller.
///
/// None of these are fatal: every rejected call leaves the round, the bet and
/// the wallet exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail")]
pub enum EngineError {
    #[error("invalid stake: {0}")]
    InvalidStake(StakeRejection),

    #[error("auto-cashout target {0} is below the 1.01x minimum")]
    InvalidAutoCashoutTarget(f64),

    #[error("cashout rejected: {0}")]
    IllegalCashout(CashoutRejection),

    #[error("a round is already {0:?}")]
    RoundAlreadyActive(Phase),

    #[error("auto-cashout is locked while the round is running")]
    AutoCashoutLocked,
}

/// Why a stake was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum StakeRejection {
    #[error("stake must be greater than zero")]
    NotPositive,
    #[error("stake must be a whole number")]
    NotInteger,
    #[error("stake is too large to represent")]
    OutOfRange,
    #[error("stake {stake} exceeds balance {balance}")]
    Unaffordable { stake: u64, balance: u64 },
}

/// Why a cashout was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum CashoutRejection {
    #[error("no active bet")]
    NoActiveBet,
    #[error("round is not running ({0:?})")]
    NotRunning(Phase),
}

// ---------------------------------------------------------------------------
// Wallet errors
// ---------------------------------------------------------------------------

/// Errors from the balance collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors raised by [`EngineConfig::validate`](crate::config::EngineConfig::validate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("house edge {0}% must lie in [0, 100)")]
    InvalidHouseEdge(f64),

    #[error("max round duration {0}ms must be positive and finite")]
    InvalidRoundDuration(f64),

    #[error("history capacity must be at least 1")]
    InvalidHistoryCapacity,

    #[error("clock constants must be positive and finite (k = {growth_rate}, p = {exponent})")]
    InvalidClock { growth_rate: f64, exponent: f64 },
}
