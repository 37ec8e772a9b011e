// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Bet Ledger
//
// Tracks the single active bet, computes payouts and drives the balance
// collaborator: stake debited at placement, payout credited at settlement.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{StakeRejection, WalletError};
use crate::types::BetView;

// ---------------------------------------------------------------------------
// Wallet collaborator
// ---------------------------------------------------------------------------

/// Balance service consumed by the engine.
pub trait Wallet {
    fn balance(&self) -> u64;
    fn debit(&mut self, amount: u64) -> Result<(), WalletError>;
    fn credit(&mut self, amount: u64);
}

/// In-memory wallet used by the browser facade, the bench and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalWallet {
    balance: u64,
}

impl LocalWallet {
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }

    pub fn deposit(&mut self, amount: u64) {
        self.credit(amount);
    }
}

impl Wallet for LocalWallet {
    fn balance(&self) -> u64 {
        self.balance
    }

    fn debit(&mut self, amount: u64) -> Result<(), WalletError> {
        if amount > self.balance {
            return Err(WalletError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }
}

// ---------------------------------------------------------------------------
// Stake
// ---------------------------------------------------------------------------

/// A validated stake: a whole number of chips greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stake(u64);

impl Stake {
    pub fn new(amount: u64) -> Result<Self, StakeRejection> {
        if amount == 0 {
            return Err(StakeRejection::NotPositive);
        }
        Ok(Self(amount))
    }

    /// Validate a stake that arrived as a float (e.g. from a JS host).
    pub fn try_from_f64(value: f64) -> Result<Self, StakeRejection> {
        if !value.is_finite() {
            return Err(StakeRejection::NotInteger);
        }
        if value <= 0.0 {
            return Err(StakeRejection::NotPositive);
        }
        if value.fract() != 0.0 {
            return Err(StakeRejection::NotInteger);
        }
        // `u64::MAX as f64` rounds up to 2^64, which is itself out of range
        if value >= u64::MAX as f64 {
            return Err(StakeRejection::OutOfRange);
        }
        Ok(Self(value as u64))
    }

    pub fn amount(&self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Bet & settlement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    stake: u64,
    cashout_multiplier: Option<f64>,
    payout: u64,
}

impl Bet {
    pub fn new(stake: Stake) -> Self {
        Self { stake: stake.amount(), cashout_multiplier: None, payout: 0 }
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    pub fn cashed_out(&self) -> bool {
        self.cashout_multiplier.is_some()
    }

    pub fn cashout_multiplier(&self) -> Option<f64> {
        self.cashout_multiplier
    }

    pub fn payout(&self) -> u64 {
        self.payout
    }

    pub fn profit(&self) -> i64 {
        profit(self.stake, self.payout)
    }

    pub fn view(&self) -> BetView {
        BetView {
            stake: self.stake,
            cashed_out: self.cashed_out(),
            cashout_multiplier: self.cashout_multiplier,
            payout: self.payout,
        }
    }
}

/// How a bet ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Crashed,
    CashedOutAt(f64),
}

/// `floor(stake * multiplier)` for a cashout, zero for a crash.
///
/// Multipliers are converted through `Decimal` so cent values floor exactly:
/// 100 at 1.15x pays 115.
pub fn settle(bet: &Bet, outcome: Outcome) -> u64 {
    match outcome {
        Outcome::Crashed => 0,
        Outcome::CashedOutAt(multiplier) => payout_for(bet.stake, multiplier),
    }
}

pub fn payout_for(stake: u64, multiplier: f64) -> u64 {
    let Some(m) = Decimal::from_f64(multiplier) else {
        return 0;
    };
    match Decimal::from(stake).checked_mul(m.max(Decimal::ZERO)) {
        Some(amount) => amount.floor().to_u64().unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

pub fn profit(stake: u64, payout: u64) -> i64 {
    signed(payout).saturating_sub(signed(stake))
}

fn signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Session accounting
// ---------------------------------------------------------------------------

/// Running totals across all rounds played on one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub rounds: u64,
    pub bets: u64,
    pub wins: u64,
    pub losses: u64,
    pub wagered: u64,
    pub paid_out: u64,
}

impl SessionStats {
    /// Player net result: paid out minus wagered.
    pub fn net(&self) -> i64 {
        profit(self.wagered, self.paid_out)
    }

    pub fn house_take(&self) -> i64 {
        -self.net()
    }

    /// Empirical return to player, `paid_out / wagered`.
    pub fn rtp(&self) -> f64 {
        if self.wagered == 0 {
            return 0.0;
        }
        self.paid_out as f64 / self.wagered as f64
    }
}

// ---------------------------------------------------------------------------
// BetLedger
// ---------------------------------------------------------------------------

/// Owns the active bet for one table.
#[derive(Debug, Clone, Default)]
pub struct BetLedger {
    active: Option<Bet>,
    stats: SessionStats,
}

impl BetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Bet> {
        self.active.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Debit the stake and make it the active bet. Nothing changes on error.
    pub fn open<W: Wallet + ?Sized>(
        &mut self,
        stake: Stake,
        wallet: &mut W,
    ) -> Result<&Bet, StakeRejection> {
        let balance = wallet.balance();
        wallet.debit(stake.amount()).map_err(|_| StakeRejection::Unaffordable {
            stake: stake.amount(),
            balance,
        })?;
        self.stats.bets += 1;
        self.stats.wagered = self.stats.wagered.saturating_add(stake.amount());
        Ok(self.active.insert(Bet::new(stake)))
    }

    /// Settle the active bet as cashed out at `multiplier` and credit the
    /// payout. Returns `None` when there is no bet or it is already cashed out;
    /// the recorded multiplier is never overwritten.
    pub fn cash_out<W: Wallet + ?Sized>(
        &mut self,
        multiplier: f64,
        wallet: &mut W,
    ) -> Option<Bet> {
        let bet = self.active.as_mut()?;
        if bet.cashed_out() {
            return None;
        }
        let payout = settle(bet, Outcome::CashedOutAt(multiplier));
        bet.cashout_multiplier = Some(multiplier);
        bet.payout = payout;
        wallet.credit(payout);
        self.stats.wins += 1;
        self.stats.paid_out = self.stats.paid_out.saturating_add(payout);
        Some(*bet)
    }

    /// Close out the round. An unclaimed bet forfeits its stake.
    pub fn settle_crash(&mut self) -> Option<Bet> {
        self.stats.rounds += 1;
        let bet = self.active.as_mut()?;
        if !bet.cashed_out() {
            bet.payout = settle(bet, Outcome::Crashed);
            self.stats.losses += 1;
        }
        Some(*bet)
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_cashout_payout() {
        let bet = Bet::new(Stake::new(100).unwrap());
        let payout = settle(&bet, Outcome::CashedOutAt(2.50));
        assert_eq!(payout, 250);
        assert_eq!(profit(100, payout), 150);
    }

    #[test]
    fn test_crash_forfeits_stake() {
        let bet = Bet::new(Stake::new(50).unwrap());
        assert_eq!(settle(&bet, Outcome::Crashed), 0);
    }

    #[test]
    fn test_cent_multipliers_floor_exactly() {
        // 100.0 * 1.15 in f64 is 114.999..., Decimal keeps it at 115
        assert_eq!(payout_for(100, 1.15), 115);
        assert_eq!(payout_for(100, 1.01), 101);
        assert_eq!(payout_for(3, 1.5), 4);
        assert_eq!(payout_for(7, 1.999), 13);
    }

    #[test]
    fn test_stake_validation() {
        assert_eq!(Stake::new(0), Err(StakeRejection::NotPositive));
        assert_eq!(Stake::try_from_f64(-5.0), Err(StakeRejection::NotPositive));
        assert_eq!(Stake::try_from_f64(0.0), Err(StakeRejection::NotPositive));
        assert_eq!(Stake::try_from_f64(10.5), Err(StakeRejection::NotInteger));
        assert_eq!(Stake::try_from_f64(f64::NAN), Err(StakeRejection::NotInteger));
        assert_eq!(Stake::try_from_f64(f64::INFINITY), Err(StakeRejection::NotInteger));
        assert_eq!(Stake::try_from_f64(25.0).map(|s| s.amount()), Ok(25));
        assert_eq!(Stake::try_from_f64(18_446_744_073_709_551_616.0), Err(StakeRejection::OutOfRange));
        assert_eq!(Stake::try_from_f64(1e300), Err(StakeRejection::OutOfRange));
        assert_eq!(Stake::try_from_f64(9_007_199_254_740_992.0).map(|s| s.amount()), Ok(1 << 53));
    }

    #[test]
    fn test_wallet_debit_rejects_overdraft() {
        let mut wallet = LocalWallet::new(10);
        assert_eq!(
            wallet.debit(11),
            Err(WalletError::InsufficientFunds { requested: 11, available: 10 })
        );
        assert_eq!(wallet.balance(), 10);
        wallet.debit(10).unwrap();
        assert_eq!(wallet.balance(), 0);
    }

    #[test]
    fn test_ledger_open_unaffordable_leaves_state() {
        let mut wallet = LocalWallet::new(40);
        let mut ledger = BetLedger::new();
        let err = ledger.open(Stake::new(50).unwrap(), &mut wallet).unwrap_err();
        assert_eq!(err, StakeRejection::Unaffordable { stake: 50, balance: 40 });
        assert!(ledger.active().is_none());
        assert_eq!(wallet.balance(), 40);
        assert_eq!(ledger.stats().bets, 0);
    }

    #[test]
    fn test_ledger_cashout_once() {
        let mut wallet = LocalWallet::new(1000);
        let mut ledger = BetLedger::new();
        ledger.open(Stake::new(100).unwrap(), &mut wallet).unwrap();
        assert_eq!(wallet.balance(), 900);

        let bet = ledger.cash_out(2.5, &mut wallet).unwrap();
        assert_eq!(bet.payout(), 250);
        assert_eq!(bet.profit(), 150);
        assert_eq!(wallet.balance(), 1150);

        // Second cashout is refused and the multiplier is immutable
        assert!(ledger.cash_out(9.0, &mut wallet).is_none());
        assert_eq!(ledger.active().unwrap().cashout_multiplier(), Some(2.5));
        assert_eq!(wallet.balance(), 1150);

        // Crash after cashout has no further financial effect
        let settled = ledger.settle_crash().unwrap();
        assert_eq!(settled.payout(), 250);
        assert_eq!(ledger.stats().wins, 1);
        assert_eq!(ledger.stats().losses, 0);
    }

    #[test]
    fn test_ledger_crash_settles_loss() {
        let mut wallet = LocalWallet::new(100);
        let mut ledger = BetLedger::new();
        ledger.open(Stake::new(50).unwrap(), &mut wallet).unwrap();
        let settled = ledger.settle_crash().unwrap();
        assert_eq!(settled.payout(), 0);
        assert_eq!(settled.profit(), -50);
        assert_eq!(wallet.balance(), 50);

        let stats = ledger.stats();
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.net(), -50);
        assert_eq!(stats.house_take(), 50);
    }
}
