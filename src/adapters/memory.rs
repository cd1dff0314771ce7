//! In-memory record stores.
//!
//! `SampleStore` keeps each team/role series sorted by match time so a
//! causal read is a binary search plus a slice. `QuoteBook` groups quotes
//! by fixture in arrival order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::types::{FixtureId, MarketQuote, Role, Sample, TeamId};
use crate::ports::sources::{QuoteSource, SampleSource};

/// Snapshot of first-half samples, time-ordered per team and role.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    series: BTreeMap<(TeamId, Role), Vec<Sample>>,
    len: usize,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample, keeping its series sorted. Samples with equal
    /// timestamps keep arrival order.
    pub fn insert(&mut self, sample: Sample) {
        let series = self
            .series
            .entry((sample.team_id.clone(), sample.role))
            .or_default();
        let at = series.partition_point(|s| s.match_timestamp <= sample.match_timestamp);
        series.insert(at, sample);
        self.len += 1;
    }

    /// Number of distinct team/role series.
    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}

impl FromIterator<Sample> for SampleStore {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut store = Self::new();
        for sample in iter {
            store.insert(sample);
        }
        store
    }
}

impl SampleSource for SampleStore {
    fn samples_before(&self, team_id: &str, role: Role, cutoff: DateTime<Utc>) -> Vec<&Sample> {
        self.series
            .get(&(team_id.to_string(), role))
            .map(|series| {
                let end = series.partition_point(|s| s.match_timestamp < cutoff);
                series[..end].iter().collect()
            })
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Market quotes grouped by fixture.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    by_fixture: BTreeMap<FixtureId, Vec<MarketQuote>>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quote: MarketQuote) {
        self.by_fixture
            .entry(quote.fixture_id.clone())
            .or_default()
            .push(quote);
    }

    pub fn len(&self) -> usize {
        self.by_fixture.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fixture.is_empty()
    }
}

impl FromIterator<MarketQuote> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = MarketQuote>>(iter: I) -> Self {
        let mut book = Self::new();
        for quote in iter {
            book.insert(quote);
        }
        book
    }
}

impl QuoteSource for QuoteBook {
    fn quotes_for(&self, fixture_id: &str) -> Vec<&MarketQuote> {
        self.by_fixture
            .get(fixture_id)
            .map(|quotes| quotes.iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::QuoteSide;
    use chrono::{Duration, TimeZone};

    fn t(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap() + Duration::days(day)
    }

    fn sample(team: &str, role: Role, day: i64, goals: u32) -> Sample {
        Sample {
            team_id: team.into(),
            role,
            match_timestamp: t(day),
            first_half_goals: goals,
        }
    }

    #[test]
    fn test_samples_sorted_and_cut() {
        let store: SampleStore = vec![
            sample("ars", Role::Home, 14, 1),
            sample("ars", Role::Home, 0, 0),
            sample("ars", Role::Home, 7, 2),
            sample("ars", Role::Away, 3, 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.len(), 4);
        assert_eq!(store.series_count(), 2);

        let before = store.samples_before("ars", Role::Home, t(14));
        let days: Vec<_> = before.iter().map(|s| s.match_timestamp).collect();
        assert_eq!(days, vec![t(0), t(7)]);
        assert!(store.samples_before("che", Role::Home, t(100)).is_empty());
    }

    #[test]
    fn test_quote_book_groups_by_fixture() {
        let book: QuoteBook = vec![
            MarketQuote {
                fixture_id: "f1".into(),
                side: QuoteSide::Under05,
                decimal_odds: 2.5,
                observed_timestamp: t(0),
            },
            MarketQuote {
                fixture_id: "f2".into(),
                side: QuoteSide::Under05,
                decimal_odds: 3.0,
                observed_timestamp: t(0),
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(book.len(), 2);
        assert_eq!(book.quotes_for("f1").len(), 1);
        assert!(book.quotes_for("f3").is_empty());
    }
}
