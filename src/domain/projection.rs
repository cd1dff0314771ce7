//! First-half "at least one goal" projection.
//!
//! The combined probability is the simple average of the home team's
//! home-scoring rate and the away team's away-scoring rate:
//!
//! ```text
//! p = (p_home + p_away) / 2
//! ```
//!
//! This is not the inclusion-exclusion form `1 - (1 - p_home)(1 - p_away)`.
//! Confidence bounds are propagated the same way, averaging the two lower
//! bounds and the two upper bounds.

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::types::{Role, TeamRateEstimate};

/// Projected over-0.5 first-half probability for one fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub probability: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub home_samples: usize,
    pub away_samples: usize,
}

impl Projection {
    pub fn ci_width(&self) -> f64 {
        self.ci_high - self.ci_low
    }

    /// Decimal odds at which a back of over 0.5 has zero expectation.
    ///
    /// `None` when the projected probability is zero, as no finite price
    /// is fair for an outcome that is never expected.
    pub fn fair_odds(&self) -> Option<f64> {
        (self.probability > 0.0).then(|| 1.0 / self.probability)
    }
}

/// Combines a home-role and an away-role estimate.
pub fn project(home: &TeamRateEstimate, away: &TeamRateEstimate) -> Projection {
    debug_assert_eq!(home.role, Role::Home);
    debug_assert_eq!(away.role, Role::Away);

    Projection {
        probability: (home.mean_goals + away.mean_goals) / 2.0,
        ci_low: (home.ci_low + away.ci_low) / 2.0,
        ci_high: (home.ci_high + away.ci_high) / 2.0,
        home_samples: home.sample_count,
        away_samples: away.sample_count,
    }
}

/// Projects from estimate results, propagating the first failure.
///
/// # Errors
/// Returns the home estimate's error if it failed, otherwise the away one's.
pub fn project_estimates(
    home: Result<TeamRateEstimate, EngineError>,
    away: Result<TeamRateEstimate, EngineError>,
) -> Result<Projection, EngineError> {
    let home = home?;
    let away = away?;
    Ok(project(&home, &away))
}
