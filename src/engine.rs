// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Round Controller

use tracing::{debug, info, warn};

use crate::auto_cashout::{self, AutoCashoutConfig};
use crate::config::EngineConfig;
use crate::crash_point;
use crate::error::{CashoutRejection, ConfigError, EngineError, StakeRejection};
use crate::history::{HistoryEntry, HistoryLog};
use crate::ledger::{Bet, BetLedger, SessionStats, Stake, Wallet};
use crate::random::RandomSource;
use crate::types::*;

// ─── Round ───────────────────────────────────────────────────────────────────

/// State of the round currently on the table.
#[derive(Debug, Clone, Default)]
pub(crate) struct Round {
    pub(crate) id: u64,
    pub(crate) phase: Phase,
    /// Secret until the round ends. Drawn once when Running begins.
    pub(crate) crash_target: Option<f64>,
    pub(crate) start_time_ms: Option<f64>,
    /// Latest true multiplier; never decreases within a round.
    pub(crate) multiplier: f64,
    pub(crate) crashed_at: Option<f64>,
    pub(crate) auto_cashed_out: bool,
}

impl Round {
    fn idle(id: u64) -> Self {
        Self { id, multiplier: 1.0, ..Self::default() }
    }
}

// ─── CrashEngine struct ──────────────────────────────────────────────────────

/// One crash table: owns the round, the active bet and the history, and
/// settles against the injected wallet.
///
/// The host drives it by calling [`tick`](Self::tick) on its own cadence;
/// the engine never reads a clock or spawns work of its own.
pub struct CrashEngine<R: RandomSource, W: Wallet> {
    pub(crate) config: EngineConfig,
    pub(crate) rand: R,
    pub(crate) wallet: W,
    pub(crate) ledger: BetLedger,
    pub(crate) history: HistoryLog,
    pub(crate) auto_cashout: AutoCashoutConfig,
    pub(crate) round: Round,
    pub(crate) rounds_started: u64,
    /// Latest host time seen by `tick`.
    pub(crate) last_now_ms: f64,
    pub(crate) last_outcome: Option<RoundOutcome>,
}

impl<R: RandomSource, W: Wallet> CrashEngine<R, W> {
    pub fn new(config: EngineConfig, rand: R, wallet: W) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rand,
            wallet,
            ledger: BetLedger::new(),
            history: HistoryLog::with_capacity(config.history_capacity),
            auto_cashout: AutoCashoutConfig::default(),
            round: Round::idle(0),
            rounds_started: 0,
            last_now_ms: 0.0,
            last_outcome: None,
        })
    }

    // ─── Betting ─────────────────────────────────────────────────────────────

    /// Accept a bet and move Idle → Betting. A finished (Crashed) round is
    /// reset first. Running begins on the next [`tick`](Self::tick).
    pub fn place_bet(&mut self, stake: u64) -> Result<BetReceipt, EngineError> {
        if self.round.phase.is_active() {
            warn!(phase = ?self.round.phase, stake, "bet rejected: round in flight");
            return Err(EngineError::RoundAlreadyActive(self.round.phase));
        }
        let stake = Stake::new(stake).map_err(EngineError::InvalidStake)?;
        let balance = self.wallet.balance();
        if stake.amount() > balance {
            warn!(stake = stake.amount(), balance, "bet rejected: unaffordable");
            return Err(EngineError::InvalidStake(StakeRejection::Unaffordable {
                stake: stake.amount(),
                balance,
            }));
        }

        if self.round.phase == Phase::Crashed {
            self.reset_round();
        }
        self.ledger
            .open(stake, &mut self.wallet)
            .map_err(EngineError::InvalidStake)?;

        self.rounds_started += 1;
        self.round = Round::idle(self.rounds_started);
        self.round.phase = Phase::Betting;
        debug!(round_id = self.round.id, stake = stake.amount(), "bet accepted");

        Ok(BetReceipt {
            round_id: self.round.id,
            stake: stake.amount(),
            balance_after: self.wallet.balance(),
        })
    }

    /// Float entry point for hosts that hand over untyped numbers.
    pub fn place_bet_f64(&mut self, stake: f64) -> Result<BetReceipt, EngineError> {
        let stake = Stake::try_from_f64(stake).map_err(EngineError::InvalidStake)?;
        self.place_bet(stake.amount())
    }

    // ─── Auto-cashout configuration ──────────────────────────────────────────

    pub fn configure_auto_cashout(&mut self, target: f64) -> Result<(), EngineError> {
        self.ensure_auto_cashout_unlocked()?;
        self.auto_cashout.set_target(target)
    }

    pub fn enable_auto_cashout(&mut self) -> Result<(), EngineError> {
        self.ensure_auto_cashout_unlocked()?;
        self.auto_cashout.enabled = true;
        Ok(())
    }

    pub fn disable_auto_cashout(&mut self) -> Result<(), EngineError> {
        self.ensure_auto_cashout_unlocked()?;
        self.auto_cashout.enabled = false;
        Ok(())
    }

    fn ensure_auto_cashout_unlocked(&self) -> Result<(), EngineError> {
        if self.round.phase == Phase::Running {
            warn!(round_id = self.round.id, "auto-cashout edit rejected: round running");
            return Err(EngineError::AutoCashoutLocked);
        }
        Ok(())
    }

    // ─── Cashout ─────────────────────────────────────────────────────────────

    /// Cash out at the multiplier of the latest tick. The round keeps running
    /// to its crash. Repeating a cashout returns the original receipt.
    pub fn cash_out(&mut self) -> Result<CashoutReceipt, EngineError> {
        let bet = match self.ledger.active() {
            Some(bet) => *bet,
            None => return Err(self.reject_cashout(CashoutRejection::NoActiveBet)),
        };
        if bet.cashed_out() {
            return Ok(self.receipt(&bet));
        }
        if self.round.phase != Phase::Running {
            return Err(self.reject_cashout(CashoutRejection::NotRunning(self.round.phase)));
        }

        let multiplier = self.round.multiplier;
        match self.ledger.cash_out(multiplier, &mut self.wallet) {
            Some(bet) => {
                info!(
                    round_id = self.round.id,
                    multiplier,
                    payout = bet.payout(),
                    "manual cashout"
                );
                Ok(self.receipt(&bet))
            }
            None => Err(self.reject_cashout(CashoutRejection::NoActiveBet)),
        }
    }

    /// Advance to `now_ms`, then cash out at that exact multiplier. If the
    /// round crashes (or auto-cashes out) on the way, that result stands.
    pub fn cash_out_at(&mut self, now_ms: f64) -> Result<CashoutReceipt, EngineError> {
        self.tick(now_ms);
        self.cash_out()
    }

    fn reject_cashout(&self, reason: CashoutRejection) -> EngineError {
        debug!(round_id = self.round.id, %reason, "cashout ignored");
        EngineError::IllegalCashout(reason)
    }

    fn receipt(&self, bet: &Bet) -> CashoutReceipt {
        CashoutReceipt {
            round_id: self.round.id,
            multiplier: bet.cashout_multiplier().unwrap_or(1.0),
            payout: bet.payout(),
            profit: bet.profit(),
            automatic: self.round.auto_cashed_out,
        }
    }

    // ─── Tick ────────────────────────────────────────────────────────────────

    /// Advance the round to host time `now_ms`. Returns the outcome on the
    /// tick that ends the round.
    pub fn tick(&mut self, now_ms: f64) -> Option<RoundOutcome> {
        if now_ms.is_finite() {
            self.last_now_ms = self.last_now_ms.max(now_ms);
        }
        match self.round.phase {
            Phase::Idle | Phase::Crashed => None,
            Phase::Betting => {
                self.start_running(now_ms);
                self.tick_running(now_ms)
            }
            Phase::Running => self.tick_running(now_ms),
        }
    }

    fn start_running(&mut self, now_ms: f64) {
        let start = if now_ms.is_finite() { now_ms } else { self.last_now_ms };
        let target = crash_point::generate(self.config.house_edge_percent, &mut self.rand);
        self.round.crash_target = Some(target);
        self.round.start_time_ms = Some(start);
        self.round.multiplier = 1.0;
        self.round.phase = Phase::Running;
        debug!(round_id = self.round.id, start_ms = start, "round running");
    }

    fn tick_running(&mut self, now_ms: f64) -> Option<RoundOutcome> {
        let start = self.round.start_time_ms?;
        let crash_target = self.round.crash_target?;
        let now = if now_ms.is_finite() { now_ms } else { self.last_now_ms };
        let elapsed_ms = (now - start).max(0.0);
        let t = self
            .config
            .clock
            .true_multiplier(elapsed_ms / 1000.0)
            .max(self.round.multiplier);
        self.round.multiplier = t;

        // Auto-cashout is arbitrated before the crash, so a target equal to
        // the crash point still pays.
        self.arbitrate_auto_cashout(t, crash_target);

        if t >= crash_target {
            return Some(self.end_round(EndReason::Crashed, crash_target, now));
        }
        if elapsed_ms >= self.config.max_round_duration_ms {
            return Some(self.end_round(EndReason::TimedOut, t, now));
        }
        None
    }

    /// Cash out at exactly the target once `t` reaches it. A target above the
    /// crash point is never honoured, however coarse the tick.
    fn arbitrate_auto_cashout(&mut self, t: f64, crash_target: f64) {
        if !auto_cashout::should_trigger(&self.auto_cashout, t) {
            return;
        }
        let target = self.auto_cashout.target;
        if target > crash_target {
            return;
        }
        if let Some(bet) = self.ledger.cash_out(target, &mut self.wallet) {
            self.round.auto_cashed_out = true;
            info!(
                round_id = self.round.id,
                target,
                payout = bet.payout(),
                "auto cashout"
            );
        }
    }

    // ─── Termination ─────────────────────────────────────────────────────────

    /// Fast-forward the round to its crash point and settle it through the
    /// same path as a natural crash. A crash point beyond the safety cap ends
    /// the round as a timeout at the cap multiplier, as ticking would.
    /// No-op when no round is in flight.
    pub fn force_end(&mut self) -> Option<RoundOutcome> {
        match self.round.phase {
            Phase::Idle | Phase::Crashed => None,
            Phase::Betting | Phase::Running => {
                if self.round.phase == Phase::Betting {
                    self.start_running(self.last_now_ms);
                }
                let crash_target = self.round.crash_target?;
                let cap = self
                    .config
                    .clock
                    .true_multiplier(self.config.max_round_duration_ms / 1000.0)
                    .max(self.round.multiplier);
                if crash_target > cap {
                    self.round.multiplier = cap;
                    self.arbitrate_auto_cashout(cap, crash_target);
                    return Some(self.end_round(EndReason::TimedOut, cap, self.last_now_ms));
                }
                self.arbitrate_auto_cashout(crash_target, crash_target);
                Some(self.end_round(EndReason::Forced, crash_target, self.last_now_ms))
            }
        }
    }

    fn end_round(&mut self, reason: EndReason, final_multiplier: f64, now_ms: f64) -> RoundOutcome {
        let crash_point = self.round.crash_target.unwrap_or(final_multiplier);
        let bet = self.ledger.settle_crash();

        self.round.phase = Phase::Crashed;
        self.round.multiplier = final_multiplier;
        self.round.crashed_at = Some(final_multiplier);

        self.history.record(HistoryEntry {
            round_id: self.round.id,
            final_multiplier,
            timestamp_ms: now_ms,
            end_reason: reason,
        });

        let outcome = RoundOutcome {
            round_id: self.round.id,
            end_reason: reason,
            crash_point,
            final_multiplier,
            stake: bet.map_or(0, |b| b.stake()),
            cashout_multiplier: bet.and_then(|b| b.cashout_multiplier()),
            payout: bet.map_or(0, |b| b.payout()),
            profit: bet.map_or(0, |b| b.profit()),
            ended_at_ms: now_ms,
        };
        info!(
            round_id = outcome.round_id,
            reason = ?reason,
            final_multiplier,
            payout = outcome.payout,
            profit = outcome.profit,
            "round settled"
        );
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Crashed → Idle: clear the finished round and its bet.
    pub fn reset_round(&mut self) {
        if self.round.phase != Phase::Crashed {
            return;
        }
        self.ledger.clear();
        self.round = Round::idle(self.round.id);
        debug!(round_id = self.round.id, "table idle");
    }

    // ─── Read-only accessors ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            round_id: self.round.id,
            phase: self.round.phase,
            true_multiplier: self.round.multiplier,
            crashed_at: match self.round.phase {
                Phase::Crashed => self.round.crashed_at,
                _ => None,
            },
            bet: self.ledger.active().map(Bet::view),
            auto_cashout: self.auto_cashout,
            balance: self.wallet.balance(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    pub fn true_multiplier(&self) -> f64 {
        self.round.multiplier
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn stats(&self) -> &SessionStats {
        self.ledger.stats()
    }

    pub fn auto_cashout(&self) -> &AutoCashoutConfig {
        &self.auto_cashout
    }

    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LocalWallet;
    use crate::random::ScriptedSource;

    fn engine(draws: &[f64], balance: u64) -> CrashEngine<ScriptedSource, LocalWallet> {
        CrashEngine::new(
            EngineConfig::default(),
            ScriptedSource::new(draws.iter().copied()),
            LocalWallet::new(balance),
        )
        .unwrap()
    }

    #[test]
    fn test_running_starts_on_first_tick() {
        let mut e = engine(&[0.5], 1000);
        e.place_bet(100).unwrap();
        assert_eq!(e.phase(), Phase::Betting);
        assert!(e.round.crash_target.is_none());

        assert!(e.tick(1_000.0).is_none());
        assert_eq!(e.phase(), Phase::Running);
        assert_eq!(e.round.start_time_ms, Some(1_000.0));
        assert_eq!(e.round.crash_target, Some(2.0));
        assert_eq!(e.true_multiplier(), 1.0);
    }

    #[test]
    fn test_backwards_clock_keeps_multiplier() {
        let mut e = engine(&[0.9], 1000);
        e.place_bet(10).unwrap();
        e.tick(0.0);
        e.tick(5_000.0);
        let m = e.true_multiplier();
        assert!(m > 1.0);
        e.tick(1_000.0);
        assert_eq!(e.true_multiplier(), m);
    }

    #[test]
    fn test_snapshot_hides_crash_target_until_end() {
        let mut e = engine(&[0.5], 1000);
        e.place_bet(100).unwrap();
        e.tick(0.0);
        let snap = e.snapshot();
        assert_eq!(snap.crashed_at, None);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(!json.contains("crash_target"));

        let t = e.config.clock.elapsed_for(2.0) * 1000.0;
        e.tick(t + 1.0).unwrap();
        assert_eq!(e.snapshot().crashed_at, Some(2.0));
    }

    #[test]
    fn test_reset_only_from_crashed() {
        let mut e = engine(&[0.5], 1000);
        e.place_bet(100).unwrap();
        e.reset_round();
        assert_eq!(e.phase(), Phase::Betting);
        e.force_end().unwrap();
        e.reset_round();
        assert_eq!(e.phase(), Phase::Idle);
        assert!(e.snapshot().bet.is_none());
    }
}
