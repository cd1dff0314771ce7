//! Record Source Ports - Synchronous Read Interfaces
//!
//! The core is polymorphic only over "a source of samples" and "a source
//! of quotes". Vendor-specific shapes are collapsed into `Sample` and
//! `MarketQuote` by external collaborators before these are queried.
//!
//! Reads are synchronous: everything is materialised in memory (or behind a
//! blocking read) before the core runs.

use chrono::{DateTime, Utc};

use crate::domain::types::{MarketQuote, Role, Sample};

/// Provides first-half samples, time-ordered per team and role.
pub trait SampleSource: Send + Sync {
  /// Samples of `team_id` in `role` with `match_timestamp < cutoff`,
  /// ascending by match time.
  fn samples_before(&self, team_id: &str, role: Role, cutoff: DateTime<Utc>) -> Vec<&Sample>;

  /// Every sample held, for snapshotting and diagnostics.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Provides market quotes per fixture.
pub trait QuoteSource: Send + Sync {
  /// All quotes recorded for `fixture_id`, any side, any time.
  fn quotes_for(&self, fixture_id: &str) -> Vec<&MarketQuote>;
}
