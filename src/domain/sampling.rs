//! Rolling occurrence-rate estimation with bootstrap confidence intervals.
//!
//! The projection target is whether any first-half goal occurs, so each
//! sample is reduced to an occurrence indicator (1 if the team scored at
//! least once before half-time, else 0) before averaging. Goal magnitude is
//! discarded: the over/under 0.5 line depends only on occurrence.
//!
//! Resampling draws from a generator seeded from the run seed plus the
//! estimate's own key (team, role, as-of instant). The same estimate is
//! therefore reproduced bit-for-bit whether it is computed in a live scan,
//! a sequential backtest or a parallel evaluation pass.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::EngineError;
use super::strategy::StrategyConfig;
use super::types::{Role, Sample, TeamRateEstimate};

/// Builds `TeamRateEstimate`s from a team's historical samples.
#[derive(Debug, Clone)]
pub struct SampleBuilder {
    min_samples_home: usize,
    min_samples_away: usize,
    window: Option<usize>,
    resamples: usize,
    confidence_level: f64,
    seed: u64,
}

impl SampleBuilder {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            min_samples_home: config.min_samples_home,
            min_samples_away: config.min_samples_away,
            window: config.sample_window,
            resamples: config.bootstrap_resamples,
            confidence_level: config.confidence_level,
            seed: config.random_seed,
        }
    }

    const fn min_samples(&self, role: Role) -> usize {
        match role {
            Role::Home => self.min_samples_home,
            Role::Away => self.min_samples_away,
        }
    }

    /// Estimates the occurrence rate of `team_id` in `role` as of `as_of`.
    ///
    /// Only samples of that team and role with `match_timestamp < as_of` are
    /// read, whatever the caller passes in. With a window configured, only the
    /// most recent `window` of those are kept.
    ///
    /// # Errors
    /// `InsufficientData` when fewer than the role's minimum samples qualify.
    pub fn estimate(
        &self,
        team_id: &str,
        role: Role,
        as_of: DateTime<Utc>,
        samples: &[&Sample],
    ) -> Result<TeamRateEstimate, EngineError> {
        let mut eligible: Vec<&Sample> = samples
            .iter()
            .copied()
            .filter(|s| s.team_id == team_id && s.role == role && s.match_timestamp < as_of)
            .collect();
        eligible.sort_by_key(|s| s.match_timestamp);

        if let Some(window) = self.window {
            let skip = eligible.len().saturating_sub(window);
            eligible.drain(..skip);
        }

        let required = self.min_samples(role);
        if eligible.len() < required {
            return Err(EngineError::InsufficientData {
                team_id: team_id.to_string(),
                role,
                found: eligible.len(),
                required,
            });
        }

        let indicators: Vec<f64> = eligible
            .iter()
            .map(|s| if s.scored() { 1.0 } else { 0.0 })
            .collect();
        let mean = mean(&indicators);

        let mut rng = StdRng::seed_from_u64(estimate_seed(self.seed, team_id, role, as_of));
        let (ci_low, ci_high) =
            bootstrap_interval(&indicators, self.resamples, self.confidence_level, &mut rng);

        Ok(TeamRateEstimate {
            team_id: team_id.to_string(),
            role,
            as_of,
            sample_count: indicators.len(),
            mean_goals: mean,
            ci_low,
            ci_high,
        })
    }
}

/// Percentile bootstrap interval of the mean.
///
/// Draws `resamples` resamples with replacement, each the size of `values`,
/// and returns the lower/upper percentiles of the resample means at the given
/// two-sided confidence level. Empty input yields `(0.0, 0.0)`.
pub fn bootstrap_interval<R: Rng + ?Sized>(
    values: &[f64],
    resamples: usize,
    confidence_level: f64,
    rng: &mut R,
) -> (f64, f64) {
    if values.is_empty() || resamples == 0 {
        return (0.0, 0.0);
    }

    let n = values.len();
    let mut means: Vec<f64> = (0..resamples)
        .map(|_| {
            let sum: f64 = (0..n).map(|_| values[rng.gen_range(0..n)]).sum();
            sum / n as f64
        })
        .collect();
    means.sort_by(f64::total_cmp);

    let alpha = 1.0 - confidence_level;
    (
        percentile(&means, alpha / 2.0),
        percentile(&means, 1.0 - alpha / 2.0),
    )
}

/// Linear-interpolated percentile of an ascending slice, `q` in [0, 1].
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Seed for one estimate, stable across runs, platforms and evaluation order.
fn estimate_seed(seed: u64, team_id: &str, role: Role, as_of: DateTime<Utc>) -> u64 {
    // FNV-1a over the team id, then a splitmix64 finalizer over the mix.
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in team_id.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let mut z = seed
        ^ h
        ^ role.seed_tag()
        ^ (as_of.timestamp_millis() as u64).rotate_left(17);
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
