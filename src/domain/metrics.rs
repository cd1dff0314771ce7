//! Backtest summary metrics.
//!
//! Computed from the per-fixture records and the bankroll trajectory.
//! Void bets count as placed but contribute nothing to staked amount, pnl,
//! averages, returns or the weekly breakdown. Weeks are ISO weeks of the
//! fixture's kickoff.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::{BankrollState, BetOutcome, BetRecord, SkipReason};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub placed_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub voids: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// wins / (wins + losses)
    pub win_rate: f64,
    pub total_staked: Decimal,
    pub total_pnl: Decimal,
    /// total_pnl / total_staked
    pub roi: f64,
    /// total_staked / (wins + losses), to the cent.
    pub avg_stake: Decimal,
    /// total_pnl / (wins + losses), to the cent.
    pub avg_profit_per_bet: Decimal,
    /// Largest peak-to-trough fall of the bankroll.
    pub max_drawdown: Decimal,
    /// `max_drawdown` relative to the peak it fell from.
    pub max_drawdown_pct: f64,
    /// Mean over standard deviation of per-bet returns (pnl / stake).
    pub sharpe_ratio: f64,
    pub starting_balance: Decimal,
    pub final_balance: Decimal,
    /// Settled bets grouped by the ISO week of their kickoff, oldest first.
    pub weekly: Vec<WeeklySummary>,
}

/// Results of the bets settled in one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub iso_year: i32,
    pub iso_week: u32,
    pub bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub staked: Decimal,
    pub pnl: Decimal,
    pub roi: f64,
}

impl WeeklySummary {
    const fn new(iso_year: i32, iso_week: u32) -> Self {
        Self {
            iso_year,
            iso_week,
            bets: 0,
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            staked: Decimal::ZERO,
            pnl: Decimal::ZERO,
            roi: 0.0,
        }
    }
}

/// Summarises one run from its per-fixture records.
pub fn calculate_summary(
    records: &[BetRecord],
    starting_balance: Decimal,
    trajectory: &[BankrollState],
) -> BacktestSummary {
    let mut skipped = BTreeMap::new();
    for reason in records.iter().filter_map(|r| r.skip_reason) {
        *skipped.entry(reason).or_insert(0) += 1;
    }

    let mut placed_bets = 0;
    let (mut wins, mut losses, mut voids) = (0, 0, 0);
    let mut total_staked = Decimal::ZERO;
    let mut total_pnl = Decimal::ZERO;
    let mut returns = Vec::new();
    let mut weeks: BTreeMap<(i32, u32), WeeklySummary> = BTreeMap::new();

    for record in records {
        let Some(bet) = &record.bet else { continue };
        placed_bets += 1;
        let won = match bet.outcome {
            BetOutcome::Win => true,
            BetOutcome::Loss => false,
            BetOutcome::Void | BetOutcome::Pending => {
                voids += 1;
                continue;
            }
        };
        if won {
            wins += 1;
        } else {
            losses += 1;
        }
        total_staked += bet.stake;
        total_pnl += bet.pnl;
        if bet.stake > Decimal::ZERO {
            returns.push((bet.pnl / bet.stake).to_f64().unwrap_or(0.0));
        }

        let week = record.kickoff_timestamp.iso_week();
        let entry = weeks
            .entry((week.year(), week.week()))
            .or_insert_with(|| WeeklySummary::new(week.year(), week.week()));
        entry.bets += 1;
        if won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }
        entry.staked += bet.stake;
        entry.pnl += bet.pnl;
    }

    let weekly = weeks
        .into_values()
        .map(|w| WeeklySummary {
            win_rate: ratio(w.wins, w.bets),
            roi: return_on(w.pnl, w.staked),
            ..w
        })
        .collect();

    let settled = wins + losses;
    let (avg_stake, avg_profit_per_bet) = if settled > 0 {
        let n = Decimal::from(settled);
        ((total_staked / n).round_dp(2), (total_pnl / n).round_dp(2))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let (max_drawdown, max_drawdown_pct) = drawdown(starting_balance, trajectory);

    BacktestSummary {
        placed_bets,
        wins,
        losses,
        voids,
        skipped,
        win_rate: ratio(wins, settled),
        total_staked,
        total_pnl,
        roi: return_on(total_pnl, total_staked),
        avg_stake,
        avg_profit_per_bet,
        max_drawdown,
        max_drawdown_pct,
        sharpe_ratio: sharpe(&returns),
        starting_balance,
        final_balance: trajectory.last().map_or(starting_balance, |s| s.balance),
        weekly,
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

fn return_on(pnl: Decimal, staked: Decimal) -> f64 {
    if staked > Decimal::ZERO {
        (pnl / staked).to_f64().unwrap_or(0.0)
    } else {
        0.0
    }
}

fn drawdown(starting_balance: Decimal, trajectory: &[BankrollState]) -> (Decimal, f64) {
    let mut peak = starting_balance;
    let mut worst = Decimal::ZERO;
    let mut worst_pct = 0.0;
    for state in trajectory {
        peak = peak.max(state.balance);
        let dd = peak - state.balance;
        if dd > worst {
            worst = dd;
            if peak > Decimal::ZERO {
                worst_pct = (dd / peak).to_f64().unwrap_or(0.0);
            }
        }
    }
    (worst, worst_pct)
}

fn sharpe(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std > 0.0 { mean / std } else { 0.0 }
}
