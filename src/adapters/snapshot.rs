//! Snapshot Loader - JSON Input Document
//!
//! Reads the `{ samples, fixtures, quotes }` document that upstream
//! collectors materialise, and indexes it into the in-memory stores.
//! Fixtures come back in kickoff order; ties keep document order.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::types::{Fixture, MarketQuote, Sample};
use crate::ports::sources::SampleSource;

use super::memory::{QuoteBook, SampleStore};

/// Raw input document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    #[serde(default)]
    pub quotes: Vec<MarketQuote>,
}

/// Indexed input, ready for the engine.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub samples: SampleStore,
    /// Non-decreasing kickoff order.
    pub fixtures: Vec<Fixture>,
    pub quotes: QuoteBook,
}

impl From<SnapshotDocument> for Snapshot {
    fn from(doc: SnapshotDocument) -> Self {
        let mut fixtures = doc.fixtures;
        fixtures.sort_by_key(|f| f.kickoff_timestamp);
        Self {
            samples: doc.samples.into_iter().collect(),
            fixtures,
            quotes: doc.quotes.into_iter().collect(),
        }
    }
}

/// Parse a snapshot document from JSON text.
///
/// # Errors
/// Fails when the text is not a valid snapshot document.
pub fn parse_snapshot(json: &str) -> Result<Snapshot> {
    let doc: SnapshotDocument =
        serde_json::from_str(json).context("Failed to parse snapshot JSON")?;
    Ok(doc.into())
}

/// Load and index a snapshot file.
///
/// # Errors
/// Fails when the file can't be read or parsed.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot = parse_snapshot(&json)
        .with_context(|| format!("Invalid snapshot {}", path.display()))?;

    info!(
        samples = snapshot.samples.len(),
        series = snapshot.samples.series_count(),
        fixtures = snapshot.fixtures.len(),
        quotes = snapshot.quotes.len(),
        "Snapshot loaded"
    );

    Ok(snapshot)
}
