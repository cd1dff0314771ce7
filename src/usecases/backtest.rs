//! Backtest Runner - Walk-forward Lay Simulation
//!
//! Drives fixtures in non-decreasing kickoff order through
//! `Pending -> Evaluated -> (Skipped | PlacedAndPending) -> Settled`.
//!
//! Causality: fixture i is evaluated only from samples strictly before its
//! kickoff and quotes observed no later than kickoff minus the configured
//! cutoff. Its result is read only when settling the bet placed on it.
//!
//! Flat staking does not read the bankroll, so evaluation may fan out over
//! scoped worker threads. Sizing, settlement and the ledger always run as
//! one sequential pass in kickoff order. A stake is sized from the bankroll
//! known strictly before the bet's placement time, so a fixture never sees
//! the result of another fixture sharing its kickoff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::domain::error::EngineError;
use crate::domain::metrics::{BacktestSummary, calculate_summary};
use crate::domain::staking::{BankrollLedger, StakingEngine};
use crate::domain::strategy::StrategyConfig;
use crate::domain::types::{BankrollState, Bet, BetRecord, Fixture, SkipReason, ValueSignal};
use crate::domain::value::quote_deadline;
use crate::ports::results::ResultSink;
use crate::ports::sources::{QuoteSource, SampleSource};

use super::evaluation::{Evaluation, FixtureEvaluator};

/// Lifecycle of one fixture inside a backtest.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureState {
  Pending,
  Evaluated(Evaluation),
  Skipped {
    reason: SkipReason,
    signal: Option<ValueSignal>,
  },
  PlacedAndPending {
    bet: Bet,
    signal: ValueSignal,
  },
  Settled {
    bet: Bet,
    signal: ValueSignal,
  },
}

/// Output of a backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
  /// One record per input fixture, in kickoff order.
  pub bets: Vec<BetRecord>,
  /// One state per win or loss, in settlement order.
  pub bankroll_trajectory: Vec<BankrollState>,
  pub summary: BacktestSummary,
}

impl BacktestOutcome {
  /// Hands every record of the run to `sink`: bets, then bankroll, then summary.
  ///
  /// # Errors
  /// Propagates the first sink failure.
  pub async fn persist<R: ResultSink + ?Sized>(&self, sink: &R) -> anyhow::Result<()> {
    sink.save_bets(&self.bets).await?;
    sink.save_bankroll(&self.bankroll_trajectory).await?;
    sink.save_summary(&self.summary).await?;
    Ok(())
  }
}

/// Walk-forward backtest over a fixed sample and quote snapshot.
pub struct BacktestRunner<'a, S: SampleSource, Q: QuoteSource> {
  samples: &'a S,
  quotes: &'a Q,
  config: StrategyConfig,
}

impl<'a, S: SampleSource, Q: QuoteSource> BacktestRunner<'a, S, Q> {
  pub const fn new(samples: &'a S, quotes: &'a Q, config: StrategyConfig) -> Self {
    Self {
      samples,
      quotes,
      config,
    }
  }

  /// Runs the backtest.
  ///
  /// # Errors
  /// - `InvalidConfiguration` for a bad config or negative bankroll
  /// - `UnsortedFixtures` when kickoffs decrease anywhere in the input
  ///
  /// Both are raised before any fixture is processed. An evaluation or
  /// settlement error that is not a recordable skip or void aborts the run.
  #[instrument(skip_all, fields(fixtures = fixtures.len(), seed = self.config.random_seed))]
  pub fn run(
    &self,
    fixtures: &[Fixture],
    starting_bankroll: Decimal,
  ) -> Result<BacktestOutcome, EngineError> {
    self.config.validate()?;
    if starting_bankroll < Decimal::ZERO {
      return Err(EngineError::invalid(format!(
        "starting bankroll must not be negative, got {starting_bankroll}"
      )));
    }
    check_kickoff_order(fixtures)?;

    info!(
      fixtures = fixtures.len(),
      samples = self.samples.len(),
      %starting_bankroll,
      mode = ?self.config.staking_mode,
      "Starting backtest"
    );

    let evaluations = self.evaluate_all(fixtures)?;

    let staking = StakingEngine::from_config(&self.config);
    let mut ledger = BankrollLedger::new(starting_bankroll);
    let mut records = Vec::with_capacity(fixtures.len());

    for (index, (fixture, evaluation)) in fixtures.iter().zip(evaluations).enumerate() {
      let state = self.advance(
        fixture,
        FixtureState::Evaluated(evaluation),
        &staking,
        &mut ledger,
      )?;
      records.push(into_record(index, fixture, state));
    }

    let summary = calculate_summary(&records, starting_bankroll, ledger.states());

    info!(
      placed = summary.placed_bets,
      wins = summary.wins,
      losses = summary.losses,
      voids = summary.voids,
      total_pnl = %summary.total_pnl,
      final_balance = %summary.final_balance,
      roi = summary.roi,
      "Backtest complete"
    );

    Ok(BacktestOutcome {
      bets: records,
      bankroll_trajectory: ledger.into_states(),
      summary,
    })
  }

  /// Evaluates every fixture, in parallel when staking ignores bankroll.
  fn evaluate_all(&self, fixtures: &[Fixture]) -> Result<Vec<Evaluation>, EngineError> {
    let evaluator = FixtureEvaluator::new(self.samples, self.quotes, &self.config);
    let workers = self.config.evaluation_workers.min(fixtures.len());

    if workers <= 1 || self.config.staking_mode.depends_on_bankroll() {
      return fixtures
        .iter()
        .map(|f| evaluator.evaluate_at_kickoff(f))
        .collect();
    }

    debug!(workers, "Evaluating fixtures in parallel");
    let evaluator = &evaluator;
    let chunk = fixtures.len().div_ceil(workers);
    std::thread::scope(|scope| {
      let handles: Vec<_> = fixtures
        .chunks(chunk)
        .map(|part| {
          scope.spawn(move || {
            part
              .iter()
              .map(|f| evaluator.evaluate_at_kickoff(f))
              .collect::<Result<Vec<_>, _>>()
          })
        })
        .collect();

      let mut evaluations = Vec::with_capacity(fixtures.len());
      for handle in handles {
        evaluations.extend(handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e))?);
      }
      Ok(evaluations)
    })
  }

  /// Drives one fixture from `Evaluated` to a terminal state.
  fn advance(
    &self,
    fixture: &Fixture,
    mut state: FixtureState,
    staking: &StakingEngine,
    ledger: &mut BankrollLedger,
  ) -> Result<FixtureState, EngineError> {
    loop {
      state = match state {
        FixtureState::Pending => {
          let evaluator = FixtureEvaluator::new(self.samples, self.quotes, &self.config);
          FixtureState::Evaluated(evaluator.evaluate_at_kickoff(fixture)?)
        }
        FixtureState::Evaluated(Evaluation::Skipped { reason, signal }) => {
          return Ok(FixtureState::Skipped { reason, signal });
        }
        FixtureState::Evaluated(Evaluation::Passed(signal)) => {
          let placed_at = placement_time(fixture, &self.config);
          let stake = staking.size(&signal, ledger.balance_at(placed_at));
          if stake <= Decimal::ZERO {
            debug!(fixture = %fixture.fixture_id, "Stake sized to zero");
            return Ok(FixtureState::Skipped {
              reason: SkipReason::NoStake,
              signal: Some(signal),
            });
          }
          let bet = staking.place(&signal, stake, placed_at);
          info!(
            fixture = %fixture.fixture_id,
            %stake,
            odds = bet.odds_used,
            edge = signal.edge,
            "Lay placed"
          );
          FixtureState::PlacedAndPending { bet, signal }
        }
        FixtureState::PlacedAndPending { bet, signal } => {
          let bet = match staking.settle(bet.clone(), fixture) {
            Ok(settled) => {
              if let Some(entry) = ledger.apply(&settled, fixture.kickoff_timestamp) {
                info!(
                  fixture = %fixture.fixture_id,
                  outcome = ?settled.outcome,
                  pnl = %settled.pnl,
                  balance = %entry.balance,
                  "Lay settled"
                );
              }
              settled
            }
            Err(err @ EngineError::UnsettledFixture { .. }) => {
              warn!(fixture = %fixture.fixture_id, error = %err, "Voiding bet");
              staking.void(bet)
            }
            Err(err) => return Err(err),
          };
          FixtureState::Settled { bet, signal }
        }
        terminal @ (FixtureState::Skipped { .. } | FixtureState::Settled { .. }) => {
          return Ok(terminal);
        }
      };
    }
  }
}

/// Runs a backtest with `seed` as the bootstrap seed.
///
/// # Errors
/// See [`BacktestRunner::run`].
pub fn run_backtest<S: SampleSource, Q: QuoteSource>(
  fixtures: &[Fixture],
  samples: &S,
  quotes: &Q,
  config: &StrategyConfig,
  starting_bankroll: Decimal,
  seed: u64,
) -> Result<BacktestOutcome, EngineError> {
  let config = StrategyConfig {
    random_seed: seed,
    ..config.clone()
  };
  BacktestRunner::new(samples, quotes, config).run(fixtures, starting_bankroll)
}

/// Rejects input whose kickoffs are not non-decreasing.
fn check_kickoff_order(fixtures: &[Fixture]) -> Result<(), EngineError> {
  for (index, pair) in fixtures.windows(2).enumerate() {
    if pair[1].kickoff_timestamp < pair[0].kickoff_timestamp {
      return Err(EngineError::UnsortedFixtures {
        index: index + 1,
        previous: pair[0].kickoff_timestamp,
        kickoff: pair[1].kickoff_timestamp,
      });
    }
  }
  Ok(())
}

/// Bets are struck at the quote cutoff, never after kickoff.
fn placement_time(fixture: &Fixture, config: &StrategyConfig) -> DateTime<Utc> {
  quote_deadline(fixture, config)
}

fn into_record(index: usize, fixture: &Fixture, state: FixtureState) -> BetRecord {
  let (bet, skip_reason, signal) = match state {
    FixtureState::Settled { bet, signal } => (Some(bet), None, Some(signal)),
    FixtureState::Skipped { reason, signal } => (None, Some(reason), signal),
    // `advance` only returns terminal states.
    FixtureState::Pending
    | FixtureState::Evaluated(_)
    | FixtureState::PlacedAndPending { .. } => (None, None, None),
  };
  BetRecord {
    fixture_id: fixture.fixture_id.clone(),
    index,
    kickoff_timestamp: fixture.kickoff_timestamp,
    bet,
    skip_reason,
    signal,
  }
}
