//! Stake sizing, lay settlement and the bankroll ledger.
//!
//! Settlement of a lay of under 0.5 first-half goals, stake `s`, lay odds
//! `o`, commission `c`:
//!   goal before half-time (lay wins):  pnl = s * (1 - c)
//!   0-0 at half-time (lay loses):      pnl = -s * (o - 1)
//!
//! Commission is charged on winnings only. Money is `Decimal`, rounded to
//! cents, so ledger sums are exact.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;

use super::error::EngineError;
use super::kelly::LayKelly;
use super::strategy::{StakingMode, StrategyConfig};
use super::types::{BankrollState, Bet, BetOutcome, Fixture, ValueSignal};

/// Converts signals into stakes and settles the resulting bets.
#[derive(Debug, Clone)]
pub struct StakingEngine {
    mode: StakingMode,
    commission_rate: Decimal,
}

impl StakingEngine {
    pub const fn new(mode: StakingMode, commission_rate: Decimal) -> Self {
        Self {
            mode,
            commission_rate,
        }
    }

    pub const fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.staking_mode, config.commission_rate)
    }

    pub const fn mode(&self) -> StakingMode {
        self.mode
    }

    /// Stake for a passing signal given the current bankroll.
    ///
    /// Flat stakes ignore both bankroll and edge. Fractional and Kelly
    /// stakes are `bankroll * fraction`, floored at zero, capped at bankroll
    /// and truncated to cents. The Kelly fraction comes from the signal's
    /// probability, odds, CI width and edge.
    pub fn size(&self, signal: &ValueSignal, bankroll: Decimal) -> Decimal {
        match self.mode {
            StakingMode::Flat { size } => size,
            StakingMode::Fractional { fraction } => share_of(bankroll, fraction),
            StakingMode::Kelly {
                kelly_fraction,
                tau_conf,
                target_edge_pct,
                stake_cap,
            } => {
                let kelly = LayKelly::new(kelly_fraction, tau_conf, target_edge_pct, stake_cap);
                share_of(bankroll, kelly.stake_fraction(signal, self.commission_rate))
            }
        }
    }

    /// Opens a pending lay bet at the signal's odds.
    pub fn place(&self, signal: &ValueSignal, stake: Decimal, placed_at: DateTime<Utc>) -> Bet {
        Bet {
            fixture_id: signal.fixture_id.clone(),
            stake,
            odds_used: signal.odds,
            outcome: BetOutcome::Pending,
            pnl: Decimal::ZERO,
            placed_at,
        }
    }

    /// Settles a pending bet against the fixture's half-time result.
    ///
    /// Already-settled bets are returned unchanged.
    ///
    /// # Errors
    /// `UnsettledFixture` when the fixture has no first-half result yet.
    pub fn settle(&self, bet: Bet, fixture: &Fixture) -> Result<Bet, EngineError> {
        if bet.is_settled() {
            return Ok(bet);
        }
        debug_assert_eq!(bet.fixture_id, fixture.fixture_id);

        let goals = fixture
            .settled_first_half_goals
            .ok_or_else(|| EngineError::UnsettledFixture {
                fixture_id: fixture.fixture_id.clone(),
            })?;

        let (outcome, pnl) = if goals >= 1 {
            (BetOutcome::Win, bet.stake * (Decimal::ONE - self.commission_rate))
        } else {
            let odds = Decimal::from_f64(bet.odds_used).ok_or_else(|| {
                EngineError::invalid(format!("unrepresentable odds {}", bet.odds_used))
            })?;
            (BetOutcome::Loss, -(bet.stake * (odds - Decimal::ONE)))
        };

        Ok(Bet {
            outcome,
            pnl: pnl.round_dp(2),
            ..bet
        })
    }

    /// Voids a bet that can never be settled. Zero pnl, no ledger entry.
    pub fn void(&self, bet: Bet) -> Bet {
        Bet {
            outcome: BetOutcome::Void,
            pnl: Decimal::ZERO,
            ..bet
        }
    }
}

fn share_of(bankroll: Decimal, fraction: Decimal) -> Decimal {
    (bankroll * fraction)
        .max(Decimal::ZERO)
        .min(bankroll.max(Decimal::ZERO))
        .round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Sequential bankroll ledger.
///
/// Each win or loss appends exactly one state whose balance is the previous
/// balance plus that bet's pnl. Pending and void bets append nothing.
///
/// States carry the settled fixture's kickoff, so fixtures sharing a kickoff
/// produce states with equal timestamps. Their order in `states` is the
/// settlement order, which is the fixtures' input order.
#[derive(Debug, Clone)]
pub struct BankrollLedger {
    starting_balance: Decimal,
    states: Vec<BankrollState>,
}

impl BankrollLedger {
    pub const fn new(starting_balance: Decimal) -> Self {
        Self {
            starting_balance,
            states: Vec::new(),
        }
    }

    pub const fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    /// Current balance (starting balance before any settlement).
    pub fn balance(&self) -> Decimal {
        self.states
            .last()
            .map_or(self.starting_balance, |s| s.balance)
    }

    /// Balance known strictly before `at`.
    ///
    /// States stamped at or after `at` are ignored, so a bet struck at `at`
    /// never sizes from a result settled at the same instant or later.
    pub fn balance_at(&self, at: DateTime<Utc>) -> Decimal {
        let known = self.states.partition_point(|s| s.timestamp < at);
        self.states[..known]
            .last()
            .map_or(self.starting_balance, |s| s.balance)
    }

    /// Appends the state produced by settling `bet` at `timestamp`.
    pub fn apply(&mut self, bet: &Bet, timestamp: DateTime<Utc>) -> Option<&BankrollState> {
        if !matches!(bet.outcome, BetOutcome::Win | BetOutcome::Loss) {
            return None;
        }
        debug_assert!(
            self.states.last().is_none_or(|s| s.timestamp <= timestamp),
            "bankroll states must be appended in time order"
        );
        let balance = self.balance() + bet.pnl;
        self.states.push(BankrollState { timestamp, balance });
        self.states.last()
    }

    pub fn states(&self) -> &[BankrollState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<BankrollState> {
        self.states
    }
}
