//! Strategy configuration record.
//!
//! A flat, immutable record passed into every entry point. Nothing in the
//! core reads ambient configuration.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::EngineError;

/// Stake sizing capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingMode {
    /// Fixed amount per bet, independent of bankroll and edge.
    Flat { size: Decimal },
    /// `bankroll * fraction`, floored at zero and capped at bankroll.
    Fractional { fraction: Decimal },
    /// Fractional Kelly for lays, weighted by CI width and edge, at most
    /// `stake_cap` of bankroll. See [`super::kelly::LayKelly`].
    Kelly {
        kelly_fraction: Decimal,
        /// CI width at which the stake falls to zero.
        tau_conf: Decimal,
        /// Edge (probability points) at which the stake stops growing.
        target_edge_pct: Decimal,
        stake_cap: Decimal,
    },
}

impl StakingMode {
    /// Whether stake sizing reads the running bankroll.
    pub const fn depends_on_bankroll(&self) -> bool {
        matches!(self, Self::Fractional { .. } | Self::Kelly { .. })
    }
}

/// Thresholds, staking and resampling parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Minimum edge (probability points, 0.02 = two points) to pass.
    pub min_edge_pct: f64,
    /// Maximum projected confidence-interval width to pass.
    pub max_ci_width: f64,
    /// Lay odds above this are rejected regardless of edge.
    pub max_odds_cap: f64,
    pub min_samples_home: usize,
    pub min_samples_away: usize,
    /// Use only the most recent N qualifying samples when set.
    pub sample_window: Option<usize>,
    /// Exchange commission charged on net winnings.
    pub commission_rate: Decimal,
    pub staking_mode: StakingMode,
    pub bootstrap_resamples: usize,
    /// Two-sided bootstrap confidence level (0.95 gives 2.5/97.5 percentiles).
    pub confidence_level: f64,
    pub random_seed: u64,
    /// Quotes must be observed at or before `kickoff - cutoff`.
    pub pre_kickoff_quote_cutoff: Duration,
    /// Worker threads for flat-mode evaluation. 1 keeps everything sequential.
    pub evaluation_workers: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            min_edge_pct: 0.0,
            max_ci_width: 1.0,
            max_odds_cap: 5.0,
            min_samples_home: 1,
            min_samples_away: 1,
            sample_window: None,
            commission_rate: dec!(0.02),
            staking_mode: StakingMode::Flat { size: dec!(10) },
            bootstrap_resamples: 500,
            confidence_level: 0.95,
            random_seed: 42,
            pre_kickoff_quote_cutoff: Duration::zero(),
            evaluation_workers: 1,
        }
    }
}

impl StrategyConfig {
    /// Rejects configurations that cannot produce a meaningful run.
    ///
    /// # Errors
    /// `InvalidConfiguration` naming the first offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(-1.0..=1.0).contains(&self.min_edge_pct) {
            return Err(EngineError::invalid(format!(
                "min_edge_pct must be in [-1, 1], got {}",
                self.min_edge_pct
            )));
        }
        if !(self.max_ci_width > 0.0 && self.max_ci_width <= 1.0) {
            return Err(EngineError::invalid(format!(
                "max_ci_width must be in (0, 1], got {}",
                self.max_ci_width
            )));
        }
        if self.max_odds_cap.is_nan() || self.max_odds_cap < 1.0 {
            return Err(EngineError::invalid(format!(
                "max_odds_cap must be >= 1.0, got {}",
                self.max_odds_cap
            )));
        }
        if self.min_samples_home == 0 || self.min_samples_away == 0 {
            return Err(EngineError::invalid("minimum sample counts must be at least 1"));
        }
        if self.sample_window == Some(0) {
            return Err(EngineError::invalid("sample_window must be positive when set"));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(EngineError::invalid(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        match self.staking_mode {
            StakingMode::Flat { size } if size <= Decimal::ZERO => {
                return Err(EngineError::invalid(format!(
                    "flat stake must be positive, got {size}"
                )));
            }
            StakingMode::Fractional { fraction }
                if fraction <= Decimal::ZERO || fraction > Decimal::ONE =>
            {
                return Err(EngineError::invalid(format!(
                    "staking fraction must be in (0, 1], got {fraction}"
                )));
            }
            StakingMode::Kelly {
                kelly_fraction,
                tau_conf,
                target_edge_pct,
                stake_cap,
            } => {
                let unit = |value: Decimal| value > Decimal::ZERO && value <= Decimal::ONE;
                if !unit(kelly_fraction) {
                    return Err(EngineError::invalid(format!(
                        "kelly_fraction must be in (0, 1], got {kelly_fraction}"
                    )));
                }
                if !unit(tau_conf) {
                    return Err(EngineError::invalid(format!(
                        "tau_conf must be in (0, 1], got {tau_conf}"
                    )));
                }
                if !unit(target_edge_pct) {
                    return Err(EngineError::invalid(format!(
                        "target_edge_pct must be in (0, 1], got {target_edge_pct}"
                    )));
                }
                if !unit(stake_cap) {
                    return Err(EngineError::invalid(format!(
                        "stake_cap must be in (0, 1], got {stake_cap}"
                    )));
                }
            }
            _ => {}
        }
        if self.bootstrap_resamples == 0 {
            return Err(EngineError::invalid("bootstrap_resamples must be positive"));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(EngineError::invalid(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.pre_kickoff_quote_cutoff < Duration::zero() {
            return Err(EngineError::invalid("pre_kickoff_quote_cutoff must not be negative"));
        }
        if self.evaluation_workers == 0 {
            return Err(EngineError::invalid("evaluation_workers must be at least 1"));
        }
        Ok(())
    }
}
