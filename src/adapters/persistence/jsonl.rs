//! JSONL Result Sink - Line-per-record Run Output
//!
//! Writes one file per record kind under the data directory:
//! `bets.jsonl`, `bankroll.jsonl`, `signals.jsonl` and `summary.json`.
//! Each run replaces the previous files. Files are written to a `.tmp`
//! sibling first and renamed into place, so readers never see a partial run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::domain::metrics::BacktestSummary;
use crate::domain::types::{BankrollState, BetRecord, ValueSignal};
use crate::ports::results::ResultSink;

pub const BETS_FILE: &str = "bets.jsonl";
pub const BANKROLL_FILE: &str = "bankroll.jsonl";
pub const SIGNALS_FILE: &str = "signals.jsonl";
pub const SUMMARY_FILE: &str = "summary.json";

/// File-backed `ResultSink`.
pub struct JsonlResultSink {
    dir: PathBuf,
}

impl JsonlResultSink {
    /// Create a sink in `data_dir`, creating the directory if needed.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize `records` one per line and atomically replace `name`.
    async fn write_lines<T: Serialize>(&self, name: &str, records: &[T]) -> Result<()> {
        let mut body = String::new();
        for record in records {
            body.push_str(
                &serde_json::to_string(record)
                    .with_context(|| format!("Failed to serialize record for {name}"))?,
            );
            body.push('\n');
        }
        self.replace(name, body.as_bytes()).await?;

        info!(file = name, records = records.len(), "Records written");
        Ok(())
    }

    async fn replace(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));

        fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to rename {}", tmp.display()))?;
        Ok(())
    }

    /// Read back every record of a JSONL file written by this sink.
    ///
    /// Blank lines are ignored; malformed lines are logged and skipped.
    /// A missing file reads as empty.
    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.dir.join(name);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    file = %path.display(),
                    line = line_no + 1,
                    error = %e,
                    "Skipping malformed record"
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ResultSink for JsonlResultSink {
    #[instrument(skip_all, fields(records = records.len()))]
    async fn save_bets(&self, records: &[BetRecord]) -> Result<()> {
        self.write_lines(BETS_FILE, records).await
    }

    #[instrument(skip_all, fields(states = states.len()))]
    async fn save_bankroll(&self, states: &[BankrollState]) -> Result<()> {
        self.write_lines(BANKROLL_FILE, states).await
    }

    #[instrument(skip_all, fields(signals = signals.len()))]
    async fn save_signals(&self, signals: &[ValueSignal]) -> Result<()> {
        self.write_lines(SIGNALS_FILE, signals).await
    }

    #[instrument(skip_all)]
    async fn save_summary(&self, summary: &BacktestSummary) -> Result<()> {
        let json =
            serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        self.replace(SUMMARY_FILE, json.as_bytes()).await?;

        info!(
            path = %self.dir.join(SUMMARY_FILE).display(),
            placed = summary.placed_bets,
            "Summary written"
        );
        Ok(())
    }
}
