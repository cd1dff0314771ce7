//! Fixture Evaluation - Estimate, Project, Quote, Evaluate
//!
//! Shared by the backtest runner and the live scanner. Takes one fixture
//! from `Pending` to `Evaluated`: both team estimates as of the decision
//! instant, the combined projection, the latest eligible lay quote, and
//! the value signal. Never reads bankroll or the fixture's result.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::error::EngineError;
use crate::domain::projection::project_estimates;
use crate::domain::sampling::SampleBuilder;
use crate::domain::strategy::StrategyConfig;
use crate::domain::types::{Fixture, Role, SkipReason, ValueSignal};
use crate::domain::value::{evaluate, quote_deadline, select_quote};
use crate::ports::sources::{QuoteSource, SampleSource};

/// Result of evaluating one fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
  /// Every gate passed; the fixture may be staked.
  Passed(ValueSignal),
  /// No bet. `signal` is present when a gate rejected an evaluated signal.
  Skipped {
    reason: SkipReason,
    signal: Option<ValueSignal>,
  },
}

impl Evaluation {
  pub fn signal(&self) -> Option<&ValueSignal> {
    match self {
      Self::Passed(signal) => Some(signal),
      Self::Skipped { signal, .. } => signal.as_ref(),
    }
  }

  /// Classifies the result of one evaluation attempt.
  ///
  /// Gate rejections and the errors [`skip_reason`] recognises become
  /// skips. Every other error is handed back to the caller.
  ///
  /// # Errors
  /// The attempt's error when it has no skip reason.
  pub fn from_attempt(
    fixture_id: &str,
    attempt: Result<ValueSignal, EngineError>,
  ) -> Result<Self, EngineError> {
    match attempt {
      Ok(signal) => match signal.rejection {
        None => Ok(Self::Passed(signal)),
        Some(reason) => {
          debug!(
            fixture = fixture_id,
            %reason,
            edge = signal.edge,
            ci_width = signal.ci_width,
            odds = signal.odds,
            "Fixture rejected by value gate"
          );
          Ok(Self::Skipped {
            reason,
            signal: Some(signal),
          })
        }
      },
      Err(err) => {
        let Some(reason) = skip_reason(&err) else {
          return Err(err);
        };
        debug!(fixture = fixture_id, error = %err, "Fixture skipped");
        Ok(Self::Skipped {
          reason,
          signal: None,
        })
      }
    }
  }
}

/// Maps a recoverable core error to the skip it produces.
pub fn skip_reason(err: &EngineError) -> Option<SkipReason> {
  match err {
    EngineError::InsufficientData { .. } => Some(SkipReason::InsufficientData),
    EngineError::NoQuoteAvailable { .. } => Some(SkipReason::NoQuoteAvailable),
    _ => None,
  }
}

/// Evaluates fixtures against a sample and quote source.
pub struct FixtureEvaluator<'a, S: SampleSource, Q: QuoteSource> {
  samples: &'a S,
  quotes: &'a Q,
  builder: SampleBuilder,
  config: &'a StrategyConfig,
}

impl<'a, S: SampleSource, Q: QuoteSource> FixtureEvaluator<'a, S, Q> {
  pub fn new(samples: &'a S, quotes: &'a Q, config: &'a StrategyConfig) -> Self {
    Self {
      samples,
      quotes,
      builder: SampleBuilder::new(config),
      config,
    }
  }

  /// Evaluates as a walk-forward backtest would: samples strictly before
  /// kickoff, quotes no later than the pre-kickoff cutoff.
  ///
  /// # Errors
  /// See [`Self::evaluate_at`].
  pub fn evaluate_at_kickoff(&self, fixture: &Fixture) -> Result<Evaluation, EngineError> {
    self.evaluate_at(fixture, fixture.kickoff_timestamp)
  }

  /// Evaluates with information available at `now`.
  ///
  /// The decision instant is `min(now, kickoff)`, so a fixture that has
  /// already kicked off is evaluated exactly as its backtest would be.
  ///
  /// # Errors
  /// Any core error that does not map to a [`SkipReason`] is returned
  /// as is rather than recorded as a skip.
  pub fn evaluate_at(
    &self,
    fixture: &Fixture,
    now: DateTime<Utc>,
  ) -> Result<Evaluation, EngineError> {
    let as_of = now.min(fixture.kickoff_timestamp);
    let deadline = quote_deadline(fixture, self.config).min(now);

    Evaluation::from_attempt(
      &fixture.fixture_id,
      self.try_evaluate(fixture, as_of, deadline),
    )
  }

  fn try_evaluate(
    &self,
    fixture: &Fixture,
    as_of: DateTime<Utc>,
    deadline: DateTime<Utc>,
  ) -> Result<ValueSignal, EngineError> {
    let home = self.builder.estimate(
      &fixture.home_team_id,
      Role::Home,
      as_of,
      &self.samples.samples_before(&fixture.home_team_id, Role::Home, as_of),
    );
    let away = self.builder.estimate(
      &fixture.away_team_id,
      Role::Away,
      as_of,
      &self.samples.samples_before(&fixture.away_team_id, Role::Away, as_of),
    );
    let projection = project_estimates(home, away)?;

    let quote = select_quote(
      fixture,
      self.quotes.quotes_for(&fixture.fixture_id),
      deadline,
    )?;

    Ok(evaluate(fixture, quote, &projection, self.config))
  }
}
