//! Core record types.
//!
//! Samples, fixtures and quotes arrive already materialised from external
//! collaborators; estimates, signals, bets and bankroll states are emitted
//! back for the caller to persist or render.
//!
//! Probabilities and odds are `f64`. Stakes, pnl and balances are `Decimal`
//! so bankroll sums are exact and reproducible.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────

/// Team identifier as supplied by the data collaborator.
pub type TeamId = String;

/// Fixture identifier as supplied by the data collaborator.
pub type FixtureId = String;

// ────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────

/// Venue role of a team within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Home,
    Away,
}

impl Role {
    /// Stable tag mixed into bootstrap seeds.
    pub(crate) const fn seed_tag(self) -> u64 {
        match self {
            Self::Home => 0x686f_6d65,
            Self::Away => 0x6177_6179,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Away => write!(f, "away"),
        }
    }
}

/// One team's first-half goal count in one match. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub team_id: TeamId,
    pub role: Role,
    pub match_timestamp: DateTime<Utc>,
    pub first_half_goals: u32,
}

impl Sample {
    /// Occurrence indicator: did this team score at least once before half-time.
    pub const fn scored(&self) -> bool {
        self.first_half_goals >= 1
    }
}

/// A scheduled or played match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub fixture_id: FixtureId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub kickoff_timestamp: DateTime<Utc>,
    /// Total first-half goals; `None` until the match has been played.
    /// Only read during settlement.
    #[serde(default)]
    pub settled_first_half_goals: Option<u32>,
}

/// Market side of the first-half 0.5 goals line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteSide {
    #[serde(rename = "over_0.5")]
    Over05,
    #[serde(rename = "under_0.5")]
    Under05,
}

impl std::fmt::Display for QuoteSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Over05 => write!(f, "over_0.5"),
            Self::Under05 => write!(f, "under_0.5"),
        }
    }
}

/// A decimal-odds price seen on the market at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub fixture_id: FixtureId,
    pub side: QuoteSide,
    pub decimal_odds: f64,
    pub observed_timestamp: DateTime<Utc>,
}

// ────────────────────────────────────────────
// Derived records
// ────────────────────────────────────────────

/// Occurrence rate of a team in one role, valid only for `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRateEstimate {
    pub team_id: TeamId,
    pub role: Role,
    pub as_of: DateTime<Utc>,
    pub sample_count: usize,
    /// Mean of the occurrence indicators, not of goal counts.
    pub mean_goals: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl TeamRateEstimate {
    pub fn ci_width(&self) -> f64 {
        self.ci_high - self.ci_low
    }
}

/// Why a fixture produced no bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientData,
    BelowEdge,
    CiTooWide,
    OddsTooHigh,
    NoQuoteAvailable,
    /// Stake sized to zero (fractional staking on an exhausted bankroll).
    NoStake,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InsufficientData => "insufficient_data",
            Self::BelowEdge => "below_edge",
            Self::CiTooWide => "ci_too_wide",
            Self::OddsTooHigh => "odds_too_high",
            Self::NoQuoteAvailable => "no_quote_available",
            Self::NoStake => "no_stake",
        };
        f.write_str(s)
    }
}

/// Outcome of a value evaluation. Lifetime is one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSignal {
    pub fixture_id: FixtureId,
    pub projected_probability: f64,
    /// Market-implied probability of a first-half goal (over 0.5).
    pub implied_probability: f64,
    pub edge: f64,
    pub ci_width: f64,
    /// Lay-side (under 0.5) decimal odds the signal was evaluated against.
    pub odds: f64,
    /// `1 / projected_probability`; absent when that probability is zero.
    pub fair_odds: Option<f64>,
    pub passes: bool,
    /// First gate that failed, when `passes` is false.
    pub rejection: Option<SkipReason>,
}

/// Settlement state of a lay bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Pending,
    Win,
    Loss,
    Void,
}

/// A lay of under 0.5 first-half goals.
///
/// Created pending at placement, settled exactly once, then immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub fixture_id: FixtureId,
    pub stake: Decimal,
    pub odds_used: f64,
    pub outcome: BetOutcome,
    pub pnl: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    pub const fn is_settled(&self) -> bool {
        !matches!(self.outcome, BetOutcome::Pending)
    }
}

/// One entry of the bankroll ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankrollState {
    pub timestamp: DateTime<Utc>,
    pub balance: Decimal,
}

/// One fixture's line in the backtest output: the bet, or why there was none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub fixture_id: FixtureId,
    /// Position in kickoff order.
    pub index: usize,
    pub kickoff_timestamp: DateTime<Utc>,
    /// Settled or voided bet, when one was placed.
    pub bet: Option<Bet>,
    pub skip_reason: Option<SkipReason>,
    /// Signal the decision was taken on, when evaluation got that far.
    pub signal: Option<ValueSignal>,
}
