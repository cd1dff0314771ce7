//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)
    .with_context(|| format!("Invalid config file: {}", path.display()))?;

  info!(
    name = %config.run.name,
    mode = ?config.run.mode,
    input = %config.run.input.display(),
    seed = config.bootstrap.random_seed,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// Fails on TOML syntax errors or validation failures.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate the file-level parameters, then the derived strategy record.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.run.input.as_os_str().is_empty(),
    "run.input must name a snapshot file"
  );
  anyhow::ensure!(
    config.staking.starting_bankroll >= 0.0,
    "staking.starting_bankroll must not be negative, got {}",
    config.staking.starting_bankroll
  );
  anyhow::ensure!(
    config.backtest.pre_kickoff_quote_cutoff_secs >= 0,
    "backtest.pre_kickoff_quote_cutoff_secs must not be negative, got {}",
    config.backtest.pre_kickoff_quote_cutoff_secs
  );

  config
    .strategy()?
    .validate()
    .context("Strategy parameters rejected")?;

  Ok(())
}
