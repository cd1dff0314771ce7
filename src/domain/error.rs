//! Engine error taxonomy.
//!
//! `InsufficientData` and `NoQuoteAvailable` are recoverable: the backtest
//! records them as skips. `UnsettledFixture` is fatal for a single fixture
//! only. `InvalidConfiguration` and `UnsortedFixtures` are rejected before
//! any fixture is processed.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::{FixtureId, Role, TeamId};

/// Errors raised by the projection, value and staking core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Fewer qualifying samples than the configured minimum.
    #[error("insufficient data for team {team_id} ({role}): {found} samples, {required} required")]
    InsufficientData {
        team_id: TeamId,
        role: Role,
        found: usize,
        required: usize,
    },

    /// No market quote observed before the pre-kickoff cutoff.
    #[error("no eligible market quote for fixture {fixture_id}")]
    NoQuoteAvailable { fixture_id: FixtureId },

    /// Settlement attempted before the half-time result exists.
    #[error("fixture {fixture_id} has no first-half result to settle against")]
    UnsettledFixture { fixture_id: FixtureId },

    /// Configuration rejected at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Backtest input is not in non-decreasing kickoff order.
    #[error(
        "fixtures not in kickoff order at index {index}: {kickoff} precedes {previous}"
    )]
    UnsortedFixtures {
        index: usize,
        previous: DateTime<Utc>,
        kickoff: DateTime<Utc>,
    },
}

impl EngineError {
    /// Shorthand used by config validation.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
