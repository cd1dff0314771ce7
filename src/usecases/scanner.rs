//! Live Scanner - Value Signals for Upcoming Fixtures
//!
//! Evaluates fixtures with whatever is known at `now`. Never places,
//! settles, or sizes anything; the caller decides what to do with the
//! signals.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::error::EngineError;
use crate::domain::strategy::StrategyConfig;
use crate::domain::types::{Fixture, FixtureId, SkipReason, ValueSignal};
use crate::ports::results::ResultSink;
use crate::ports::sources::{QuoteSource, SampleSource};

use super::evaluation::{Evaluation, FixtureEvaluator};

/// Result of one live scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
  pub as_of: DateTime<Utc>,
  /// Signals that cleared every gate, in input order.
  pub signals: Vec<ValueSignal>,
  pub skipped: Vec<(FixtureId, SkipReason)>,
}

impl ScanReport {
  /// Persists the passing signals.
  ///
  /// # Errors
  /// Propagates the sink failure.
  pub async fn persist<R: ResultSink + ?Sized>(&self, sink: &R) -> anyhow::Result<()> {
    sink.save_signals(&self.signals).await
  }
}

/// Returns the passing value signals for `fixtures` as of `now`.
///
/// # Errors
/// - `InvalidConfiguration` when `config` fails validation
/// - any evaluation error that is not a recordable skip
#[instrument(skip_all, fields(fixtures = fixtures.len(), %now))]
pub fn evaluate_live<S: SampleSource, Q: QuoteSource>(
  fixtures: &[Fixture],
  samples: &S,
  quotes: &Q,
  config: &StrategyConfig,
  now: DateTime<Utc>,
) -> Result<ScanReport, EngineError> {
  config.validate()?;
  let evaluator = FixtureEvaluator::new(samples, quotes, config);

  let mut signals = Vec::new();
  let mut skipped = Vec::new();
  for fixture in fixtures {
    match evaluator.evaluate_at(fixture, now)? {
      Evaluation::Passed(signal) => signals.push(signal),
      Evaluation::Skipped { reason, .. } => skipped.push((fixture.fixture_id.clone(), reason)),
    }
  }

  info!(
    passing = signals.len(),
    skipped = skipped.len(),
    "Live scan complete"
  );

  Ok(ScanReport {
    as_of: now,
    signals,
    skipped,
  })
}
