//! Value detection for the lay-the-under strategy.
//!
//! We lay "under 0.5 first-half goals", i.e. we are paid when a goal is
//! scored before half-time. The lay-side decimal odds `o` imply
//! `P(no goal) = 1 / o`, so the market's probability of the outcome we are
//! exposed to winning on is `1 - 1 / o`. Edge is measured against that.
//!
//! Gates, in evaluation order:
//! - edge >= `min_edge_pct`
//! - projected CI width <= `max_ci_width`
//! - lay odds <= `max_odds_cap` (liability scales with `odds - 1`)

use chrono::{DateTime, Utc};

use super::error::EngineError;
use super::projection::Projection;
use super::strategy::StrategyConfig;
use super::types::{Fixture, MarketQuote, QuoteSide, SkipReason, ValueSignal};

/// Market-implied probability of at least one first-half goal from lay odds.
pub fn implied_over_probability(lay_odds: f64) -> f64 {
    1.0 - 1.0 / lay_odds
}

/// Latest instant a quote may have been observed to be usable for `fixture`.
pub fn quote_deadline(fixture: &Fixture, config: &StrategyConfig) -> DateTime<Utc> {
    fixture.kickoff_timestamp - config.pre_kickoff_quote_cutoff
}

/// Picks the lay-side quote to trade on.
///
/// Considers only under-0.5 quotes for the fixture with usable odds that were
/// observed at or before `deadline`, and returns the most recently observed
/// one. Among equal timestamps the last in input order wins.
///
/// # Errors
/// `NoQuoteAvailable` when nothing qualifies.
pub fn select_quote<'a, I>(
    fixture: &Fixture,
    quotes: I,
    deadline: DateTime<Utc>,
) -> Result<&'a MarketQuote, EngineError>
where
    I: IntoIterator<Item = &'a MarketQuote>,
{
    quotes
        .into_iter()
        .filter(|q| {
            q.fixture_id == fixture.fixture_id
                && q.side == QuoteSide::Under05
                && q.decimal_odds.is_finite()
                && q.decimal_odds > 1.0
                && q.observed_timestamp <= deadline
        })
        .max_by_key(|q| q.observed_timestamp)
        .ok_or_else(|| EngineError::NoQuoteAvailable {
            fixture_id: fixture.fixture_id.clone(),
        })
}

/// Evaluates a projection against a lay quote. Pure.
pub fn evaluate(
    fixture: &Fixture,
    quote: &MarketQuote,
    projection: &Projection,
    config: &StrategyConfig,
) -> ValueSignal {
    let odds = quote.decimal_odds;
    let implied_probability = implied_over_probability(odds);
    let edge = projection.probability - implied_probability;
    let ci_width = projection.ci_width();

    let rejection = if edge < config.min_edge_pct {
        Some(SkipReason::BelowEdge)
    } else if ci_width > config.max_ci_width {
        Some(SkipReason::CiTooWide)
    } else if odds > config.max_odds_cap {
        Some(SkipReason::OddsTooHigh)
    } else {
        None
    };

    ValueSignal {
        fixture_id: fixture.fixture_id.clone(),
        projected_probability: projection.probability,
        implied_probability,
        edge,
        ci_width,
        odds,
        fair_odds: projection.fair_odds(),
        passes: rejection.is_none(),
        rejection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 14, 15, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        Fixture {
            fixture_id: "f1".into(),
            home_team_id: "h".into(),
            away_team_id: "a".into(),
            kickoff_timestamp: kickoff(),
            settled_first_half_goals: None,
        }
    }

    fn quote(side: QuoteSide, odds: f64, mins_before: i64) -> MarketQuote {
        MarketQuote {
            fixture_id: "f1".into(),
            side,
            decimal_odds: odds,
            observed_timestamp: kickoff() - Duration::minutes(mins_before),
        }
    }

    fn projection(p: f64, lo: f64, hi: f64) -> Projection {
        Projection {
            probability: p,
            ci_low: lo,
            ci_high: hi,
            home_samples: 10,
            away_samples: 10,
        }
    }

    #[test]
    fn test_edge_against_lay_odds() {
        let signal = evaluate(
            &fixture(),
            &quote(QuoteSide::Under05, 2.5, 30),
            &projection(0.62, 0.5, 0.7),
            &StrategyConfig::default(),
        );
        assert!((signal.implied_probability - 0.6).abs() < 1e-12);
        assert!((signal.edge - 0.02).abs() < 1e-9);
        assert!(signal.passes);
        assert_eq!(signal.rejection, None);
    }

    #[test]
    fn test_below_edge_rejected() {
        let cfg = StrategyConfig {
            min_edge_pct: 0.05,
            ..StrategyConfig::default()
        };
        let signal = evaluate(
            &fixture(),
            &quote(QuoteSide::Under05, 2.5, 30),
            &projection(0.62, 0.5, 0.7),
            &cfg,
        );
        assert!(!signal.passes);
        assert_eq!(signal.rejection, Some(SkipReason::BelowEdge));
    }

    #[test]
    fn test_wide_interval_rejected() {
        let cfg = StrategyConfig {
            max_ci_width: 0.1,
            ..StrategyConfig::default()
        };
        let signal = evaluate(
            &fixture(),
            &quote(QuoteSide::Under05, 2.0, 30),
            &projection(0.75, 0.5, 0.9),
            &cfg,
        );
        assert_eq!(signal.rejection, Some(SkipReason::CiTooWide));
    }

    #[test]
    fn test_odds_cap_rejects_despite_edge() {
        let signal = evaluate(
            &fixture(),
            &quote(QuoteSide::Under05, 8.0, 30),
            &projection(0.95, 0.9, 0.98),
            &StrategyConfig::default(),
        );
        assert!(signal.edge > 0.0);
        assert_eq!(signal.rejection, Some(SkipReason::OddsTooHigh));
    }

    #[test]
    fn test_select_latest_before_deadline() {
        let quotes = vec![
            quote(QuoteSide::Under05, 2.2, 120),
            quote(QuoteSide::Under05, 2.4, 60),
            quote(QuoteSide::Under05, 3.0, 5),
            quote(QuoteSide::Over05, 1.5, 50),
        ];
        let cfg = StrategyConfig {
            pre_kickoff_quote_cutoff: Duration::minutes(30),
            ..StrategyConfig::default()
        };
        let q = select_quote(&fixture(), &quotes, quote_deadline(&fixture(), &cfg)).unwrap();
        assert_eq!(q.decimal_odds, 2.4);
    }

    #[test]
    fn test_quote_at_deadline_is_eligible() {
        let quotes = vec![quote(QuoteSide::Under05, 2.4, 0)];
        let q = select_quote(&fixture(), &quotes, kickoff()).unwrap();
        assert_eq!(q.decimal_odds, 2.4);
    }

    #[test]
    fn test_no_quote_available() {
        let quotes = vec![
            quote(QuoteSide::Over05, 1.5, 60),
            quote(QuoteSide::Under05, 1.0, 60),
        ];
        let err = select_quote(&fixture(), &quotes, kickoff()).unwrap_err();
        assert_eq!(
            err,
            EngineError::NoQuoteAvailable {
                fixture_id: "f1".into()
            }
        );
    }
}
