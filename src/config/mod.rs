//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads `config.toml` into `AppConfig`. Every threshold, staking parameter
//! and seed lives here; the domain layer only ever sees the flattened,
//! immutable `StrategyConfig` produced by `AppConfig::strategy()`.

pub mod loader;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

use crate::domain::strategy::{StakingMode, StrategyConfig};

/// Top-level engine configuration.
///
/// Every section is optional; missing keys fall back to the engine defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Run identity, mode and input.
  pub run: RunConfig,
  /// Value gates and sample requirements.
  pub thresholds: ThresholdConfig,
  /// Stake sizing and settlement.
  pub staking: StakingConfig,
  /// Bootstrap confidence intervals.
  pub bootstrap: BootstrapConfig,
  /// Walk-forward simulation knobs.
  pub backtest: BacktestConfig,
  /// Output location.
  pub persistence: PersistenceConfig,
}

/// What the binary does when started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
  /// Walk-forward simulation over the whole snapshot.
  #[default]
  Backtest,
  /// Value signals for fixtures as of `now`.
  Scan,
}

/// Run identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
  /// Human-readable run name, echoed in logs.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
  pub mode: RunMode,
  /// JSON snapshot of samples, fixtures and quotes.
  pub input: PathBuf,
  /// Scan instant as an RFC 3339 string; wall clock when absent.
  pub now: Option<DateTime<Utc>>,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      name: "fh-lay".to_string(),
      log_level: default_log_level(),
      mode: RunMode::default(),
      input: PathBuf::from("data/snapshot.json"),
      now: None,
    }
  }
}

/// Value gate configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
  /// Minimum edge in probability points (0.05 = five points).
  pub min_edge_pct: f64,
  pub max_ci_width: f64,
  /// Highest lay odds accepted. Caps liability per unit staked.
  pub max_odds_cap: f64,
  pub min_samples_home: usize,
  pub min_samples_away: usize,
  /// Use only the most recent N samples per team and role.
  pub sample_window: Option<usize>,
}

impl Default for ThresholdConfig {
  fn default() -> Self {
    let d = StrategyConfig::default();
    Self {
      min_edge_pct: d.min_edge_pct,
      max_ci_width: d.max_ci_width,
      max_odds_cap: d.max_odds_cap,
      min_samples_home: d.min_samples_home,
      min_samples_away: d.min_samples_away,
      sample_window: d.sample_window,
    }
  }
}

/// Staking mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakingKind {
  #[default]
  Flat,
  Fractional,
  #[serde(alias = "dynamic")]
  Kelly,
}

/// Stake sizing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StakingConfig {
  pub mode: StakingKind,
  /// Constant stake for flat mode.
  pub flat_size: f64,
  /// Share of the current balance staked in fractional mode.
  pub fraction: f64,
  /// Kelly mode: multiplier on full Kelly.
  pub kelly_fraction: f64,
  /// Kelly mode: CI width at which the stake reaches zero.
  pub tau_conf: f64,
  /// Kelly mode: edge (probability points) where the stake stops growing.
  pub target_edge_pct: f64,
  /// Kelly mode: largest share of bankroll on one bet.
  pub stake_cap: f64,
  /// Exchange commission on net winnings.
  pub commission_rate: f64,
  pub starting_bankroll: f64,
}

impl Default for StakingConfig {
  fn default() -> Self {
    Self {
      mode: StakingKind::Flat,
      flat_size: 10.0,
      fraction: 0.02,
      kelly_fraction: 0.5,
      tau_conf: 0.20,
      target_edge_pct: 0.05,
      stake_cap: 0.03,
      commission_rate: 0.02,
      starting_bankroll: 1000.0,
    }
  }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
  pub resamples: usize,
  pub random_seed: u64,
  /// Two-sided interval coverage (0.95 = 2.5th to 97.5th percentile).
  pub confidence_level: f64,
}

impl Default for BootstrapConfig {
  fn default() -> Self {
    let d = StrategyConfig::default();
    Self {
      resamples: d.bootstrap_resamples,
      random_seed: d.random_seed,
      confidence_level: d.confidence_level,
    }
  }
}

/// Walk-forward simulation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
  /// Quotes observed later than this many seconds before kickoff are ignored.
  pub pre_kickoff_quote_cutoff_secs: i64,
  /// Evaluation threads for flat staking. 1 = sequential.
  pub evaluation_workers: usize,
}

impl Default for BacktestConfig {
  fn default() -> Self {
    Self {
      pre_kickoff_quote_cutoff_secs: 0,
      evaluation_workers: 1,
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
  /// Directory for JSONL bet, bankroll and signal logs.
  pub data_dir: PathBuf,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("data/out"),
    }
  }
}

impl AppConfig {
  /// Flattens the file sections into the record the core consumes.
  ///
  /// # Errors
  /// Fails when a money value has no exact decimal representation
  /// (NaN or infinite).
  pub fn strategy(&self) -> Result<StrategyConfig> {
    let staking_mode = match self.staking.mode {
      StakingKind::Flat => StakingMode::Flat {
        size: to_decimal(self.staking.flat_size, "staking.flat_size")?,
      },
      StakingKind::Fractional => StakingMode::Fractional {
        fraction: to_decimal(self.staking.fraction, "staking.fraction")?,
      },
      StakingKind::Kelly => StakingMode::Kelly {
        kelly_fraction: to_decimal(self.staking.kelly_fraction, "staking.kelly_fraction")?,
        tau_conf: to_decimal(self.staking.tau_conf, "staking.tau_conf")?,
        target_edge_pct: to_decimal(self.staking.target_edge_pct, "staking.target_edge_pct")?,
        stake_cap: to_decimal(self.staking.stake_cap, "staking.stake_cap")?,
      },
    };

    Ok(StrategyConfig {
      min_edge_pct: self.thresholds.min_edge_pct,
      max_ci_width: self.thresholds.max_ci_width,
      max_odds_cap: self.thresholds.max_odds_cap,
      min_samples_home: self.thresholds.min_samples_home,
      min_samples_away: self.thresholds.min_samples_away,
      sample_window: self.thresholds.sample_window,
      commission_rate: to_decimal(self.staking.commission_rate, "staking.commission_rate")?,
      staking_mode,
      bootstrap_resamples: self.bootstrap.resamples,
      confidence_level: self.bootstrap.confidence_level,
      random_seed: self.bootstrap.random_seed,
      pre_kickoff_quote_cutoff: Duration::seconds(self.backtest.pre_kickoff_quote_cutoff_secs),
      evaluation_workers: self.backtest.evaluation_workers,
    })
  }

  /// Starting bankroll as an exact decimal.
  ///
  /// # Errors
  /// Fails for NaN or infinite values.
  pub fn starting_bankroll(&self) -> Result<Decimal> {
    to_decimal(self.staking.starting_bankroll, "staking.starting_bankroll")
  }
}

fn to_decimal(value: f64, key: &str) -> Result<Decimal> {
  Decimal::from_f64(value)
    .with_context(|| format!("{key} is not a finite number: {value}"))
}

fn default_log_level() -> String {
  "info".to_string()
}
