//! Result Sink Port - Persistence of Engine Output
//!
//! The core never writes files itself. Callers hand the records it
//! returns to a `ResultSink`; the JSONL adapter is the default one.

use async_trait::async_trait;

use crate::domain::metrics::BacktestSummary;
use crate::domain::types::{BankrollState, BetRecord, ValueSignal};

/// Trait for engine output persistence.
#[async_trait]
pub trait ResultSink: Send + Sync {
  /// Persist the per-fixture audit log of a backtest, skips included.
  async fn save_bets(&self, records: &[BetRecord]) -> anyhow::Result<()>;

  /// Persist the bankroll trajectory.
  async fn save_bankroll(&self, states: &[BankrollState]) -> anyhow::Result<()>;

  /// Persist live-scan signals.
  async fn save_signals(&self, signals: &[ValueSignal]) -> anyhow::Result<()>;

  /// Persist the run summary.
  async fn save_summary(&self, summary: &BacktestSummary) -> anyhow::Result<()>;
}
