//! Backtest Framework - Walk-forward Simulation Scenarios
//!
//! Runs the full engine over synthetic seasons and checks the
//! properties a lay backtest must hold: causality, determinism,
//! bankroll conservation and a complete skip audit trail.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use fh_lay_engine::adapters::memory::{QuoteBook, SampleStore};
use fh_lay_engine::domain::error::EngineError;
use fh_lay_engine::domain::strategy::{StakingMode, StrategyConfig};
use fh_lay_engine::domain::types::{
    BetOutcome, Fixture, MarketQuote, QuoteSide, Role, Sample, SkipReason,
};
use fh_lay_engine::usecases::{BacktestOutcome, BacktestRunner, run_backtest};

const TEAMS: [&str; 6] = ["ars", "che", "liv", "mci", "mun", "tot"];

/// One synthetic season: played matches feed samples, fixtures and quotes.
struct Season {
    fixtures: Vec<Fixture>,
    samples: Vec<Sample>,
    quotes: Vec<MarketQuote>,
}

impl Season {
    /// Ten rounds of three matches each, a week apart. Every match is a
    /// fixture with two lay quotes and, once played, one sample per side.
    fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = Utc.with_ymd_and_hms(2023, 8, 5, 15, 0, 0).unwrap();
        let mut fixtures = Vec::new();
        let mut samples = Vec::new();
        let mut quotes = Vec::new();

        for round in 0..10_i64 {
            let kickoff = start + Duration::weeks(round);
            let offset = round as usize;
            for m in 0..3 {
                let home = TEAMS[(offset + m) % TEAMS.len()];
                let away = TEAMS[(offset + m + 3) % TEAMS.len()];
                let home_goals = u32::from(rng.gen_bool(0.6)) + u32::from(rng.gen_bool(0.15));
                let away_goals = u32::from(rng.gen_bool(0.45));
                let id = format!("r{round}m{m}");

                fixtures.push(Fixture {
                    fixture_id: id.clone(),
                    home_team_id: home.into(),
                    away_team_id: away.into(),
                    kickoff_timestamp: kickoff,
                    settled_first_half_goals: Some(home_goals + away_goals),
                });
                samples.push(sample(home, Role::Home, kickoff, home_goals));
                samples.push(sample(away, Role::Away, kickoff, away_goals));
                quotes.push(lay(&id, rng.gen_range(1.6..3.6), kickoff - Duration::hours(3)));
                quotes.push(lay(&id, rng.gen_range(1.6..3.6), kickoff - Duration::minutes(20)));
            }
        }

        Self {
            fixtures,
            samples,
            quotes,
        }
    }

    fn stores(&self) -> (SampleStore, QuoteBook) {
        (
            self.samples.iter().cloned().collect(),
            self.quotes.iter().cloned().collect(),
        )
    }
}

fn sample(team: &str, role: Role, at: DateTime<Utc>, goals: u32) -> Sample {
    Sample {
        team_id: team.into(),
        role,
        match_timestamp: at,
        first_half_goals: goals,
    }
}

fn lay(fixture_id: &str, odds: f64, at: DateTime<Utc>) -> MarketQuote {
    MarketQuote {
        fixture_id: fixture_id.into(),
        side: QuoteSide::Under05,
        decimal_odds: odds,
        observed_timestamp: at,
    }
}

fn permissive(staking_mode: StakingMode) -> StrategyConfig {
    StrategyConfig {
        min_edge_pct: 0.0,
        max_ci_width: 1.0,
        max_odds_cap: 10.0,
        min_samples_home: 2,
        min_samples_away: 2,
        staking_mode,
        bootstrap_resamples: 200,
        ..StrategyConfig::default()
    }
}

fn run(season: &Season, config: StrategyConfig) -> BacktestOutcome {
    let (samples, quotes) = season.stores();
    BacktestRunner::new(&samples, &quotes, config)
        .run(&season.fixtures, dec!(1000))
        .unwrap()
}

// ── Single-fixture scenario ─────────────────────────────────

#[test]
fn test_single_fixture_lay_is_placed_and_settled() {
    let kickoff = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
    let mut samples = Vec::new();
    for i in 0..10_i64 {
        let at = kickoff - Duration::weeks(20 - i);
        samples.push(sample("h", Role::Home, at, u32::from(i < 8)));
        samples.push(sample("a", Role::Away, at, u32::from(i < 7)));
    }
    let samples: SampleStore = samples.into_iter().collect();
    let quotes: QuoteBook = vec![lay("f1", 2.0, kickoff - Duration::hours(1))]
        .into_iter()
        .collect();
    let fixture = Fixture {
        fixture_id: "f1".into(),
        home_team_id: "h".into(),
        away_team_id: "a".into(),
        kickoff_timestamp: kickoff,
        settled_first_half_goals: Some(0),
    };
    let config = StrategyConfig {
        staking_mode: StakingMode::Flat { size: dec!(100) },
        min_samples_home: 10,
        min_samples_away: 10,
        ..StrategyConfig::default()
    };

    let out = run_backtest(&[fixture], &samples, &quotes, &config, dec!(1000), 7).unwrap();

    let record = &out.bets[0];
    let signal = record.signal.as_ref().unwrap();
    assert!((signal.projected_probability - 0.75).abs() < 1e-12);
    assert!((signal.implied_probability - 0.5).abs() < 1e-12);
    assert!((signal.edge - 0.25).abs() < 1e-12);

    // Goalless first half: the lay loses stake * (odds - 1).
    let bet = record.bet.as_ref().unwrap();
    assert_eq!(bet.outcome, BetOutcome::Loss);
    assert_eq!(bet.pnl, dec!(-100));
    assert_eq!(out.bankroll_trajectory.len(), 1);
    assert_eq!(out.bankroll_trajectory[0].balance, dec!(900));
    assert_eq!(out.summary.final_balance, dec!(900));
}

// ── Walk-forward properties ─────────────────────────────────

#[test]
fn test_every_fixture_is_accounted_for() {
    let season = Season::generate(11);
    let out = run(&season, permissive(StakingMode::Flat { size: dec!(10) }));

    assert_eq!(out.bets.len(), season.fixtures.len());
    for (i, record) in out.bets.iter().enumerate() {
        assert_eq!(record.index, i);
        assert_eq!(record.fixture_id, season.fixtures[i].fixture_id);
        assert!(
            record.bet.is_some() ^ record.skip_reason.is_some(),
            "fixture {} must have exactly one of bet or skip",
            record.fixture_id
        );
    }

    // Round 0 has no history at all.
    for record in &out.bets[..3] {
        assert_eq!(record.skip_reason, Some(SkipReason::InsufficientData));
    }

    let skipped: usize = out.summary.skipped.values().sum();
    assert_eq!(out.summary.placed_bets + skipped, season.fixtures.len());
    assert!(out.summary.placed_bets > 0, "permissive gates should place bets");
}

#[test]
fn test_future_information_cannot_change_past_decisions() {
    let season = Season::generate(5);
    let config = permissive(StakingMode::Fractional { fraction: dec!(0.05) });
    let baseline = run(&season, config.clone());

    let cut = 17;
    let kickoff = season.fixtures[cut].kickoff_timestamp;

    // Rewrite everything the engine must not see when deciding fixture `cut`.
    let mut tampered = Season {
        fixtures: season.fixtures.clone(),
        samples: season.samples.clone(),
        quotes: season.quotes.clone(),
    };
    for s in &mut tampered.samples {
        if s.match_timestamp >= kickoff {
            s.first_half_goals = if s.first_half_goals == 0 { 3 } else { 0 };
        }
    }
    for q in &mut tampered.quotes {
        if q.observed_timestamp > kickoff {
            q.decimal_odds = 9.5;
        }
    }
    tampered
        .quotes
        .push(lay(&season.fixtures[cut].fixture_id, 1.01, kickoff + Duration::minutes(1)));
    for f in &mut tampered.fixtures[cut + 1..] {
        f.settled_first_half_goals = Some(0);
    }

    let altered = run(&tampered, config);

    assert_eq!(baseline.bets[..=cut], altered.bets[..=cut]);
    let settled_by_cut = baseline
        .bankroll_trajectory
        .iter()
        .take_while(|s| s.timestamp <= kickoff)
        .count();
    assert_eq!(
        baseline.bankroll_trajectory[..settled_by_cut],
        altered.bankroll_trajectory[..settled_by_cut]
    );
}

#[test]
fn test_same_seed_same_output() {
    let season = Season::generate(23);
    let config = permissive(StakingMode::Fractional { fraction: dec!(0.02) });
    assert_eq!(run(&season, config.clone()), run(&season, config));
}

#[test]
fn test_seed_moves_intervals_but_not_means() {
    let season = Season::generate(23);
    let a = run(&season, StrategyConfig { random_seed: 1, ..permissive(StakingMode::Flat { size: dec!(10) }) });
    let b = run(&season, StrategyConfig { random_seed: 2, ..permissive(StakingMode::Flat { size: dec!(10) }) });

    let mut widths_differ = false;
    for (ra, rb) in a.bets.iter().zip(&b.bets) {
        if let (Some(sa), Some(sb)) = (&ra.signal, &rb.signal) {
            assert!((sa.projected_probability - sb.projected_probability).abs() < 1e-12);
            widths_differ |= (sa.ci_width - sb.ci_width).abs() > 1e-12;
        }
    }
    assert!(widths_differ);
}

#[test]
fn test_bankroll_is_conserved() {
    let season = Season::generate(42);
    let out = run(&season, permissive(StakingMode::Fractional { fraction: dec!(0.1) }));

    let settled_pnl: Decimal = out
        .bets
        .iter()
        .filter_map(|r| r.bet.as_ref())
        .map(|b| b.pnl)
        .sum();
    assert_eq!(out.summary.final_balance, dec!(1000) + settled_pnl);
    assert_eq!(out.summary.total_pnl, settled_pnl);

    let mut previous = dec!(1000);
    let mut pnls = out
        .bets
        .iter()
        .filter_map(|r| r.bet.as_ref())
        .filter(|b| matches!(b.outcome, BetOutcome::Win | BetOutcome::Loss))
        .map(|b| b.pnl);
    for state in &out.bankroll_trajectory {
        assert_eq!(state.balance, previous + pnls.next().unwrap());
        previous = state.balance;
    }
    assert!(pnls.next().is_none());

    // Fixtures sharing a kickoff leave states with equal timestamps. They
    // follow the input order of the fixtures that produced them.
    let settled: Vec<_> = out
        .bets
        .iter()
        .filter(|r| {
            r.bet
                .as_ref()
                .is_some_and(|b| matches!(b.outcome, BetOutcome::Win | BetOutcome::Loss))
        })
        .collect();
    assert_eq!(settled.len(), out.bankroll_trajectory.len());
    for (record, state) in settled.iter().zip(&out.bankroll_trajectory) {
        assert_eq!(state.timestamp, record.kickoff_timestamp);
    }
    for pair in settled.windows(2) {
        assert!(pair[0].index < pair[1].index);
    }
    for pair in out.bankroll_trajectory.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[test]
fn test_fractional_stake_never_exceeds_balance() {
    let season = Season::generate(99);
    let out = run(&season, permissive(StakingMode::Fractional { fraction: dec!(1) }));

    // Each round shares one kickoff, so every stake in it is sized from
    // the balance left by the rounds before.
    let mut known = dec!(1000);
    let mut running = known;
    let mut round = None;
    for record in &out.bets {
        if round != Some(record.kickoff_timestamp) {
            round = Some(record.kickoff_timestamp);
            known = running;
        }
        if let Some(bet) = &record.bet {
            let available = known.max(Decimal::ZERO);
            assert!(bet.stake <= available, "stake {} over balance {known}", bet.stake);
            assert_eq!(bet.stake, available.round_dp_with_strategy(2, RoundingStrategy::ToZero));
            if matches!(bet.outcome, BetOutcome::Win | BetOutcome::Loss) {
                running += bet.pnl;
            }
        }
    }
}

#[test]
fn test_kelly_stakes_stay_under_cap() {
    let season = Season::generate(7);
    let out = run(
        &season,
        permissive(StakingMode::Kelly {
            kelly_fraction: dec!(0.5),
            tau_conf: dec!(0.9),
            target_edge_pct: dec!(0.05),
            stake_cap: dec!(0.03),
        }),
    );

    let mut known = dec!(1000);
    let mut running = known;
    let mut round = None;
    let mut placed = 0;
    for record in &out.bets {
        if round != Some(record.kickoff_timestamp) {
            round = Some(record.kickoff_timestamp);
            known = running;
        }
        if let Some(bet) = &record.bet {
            placed += 1;
            assert!(bet.stake > Decimal::ZERO);
            assert!(bet.stake <= (known * dec!(0.03)).round_dp(2));
            assert!(record.signal.as_ref().unwrap().edge > 0.0);
            running += bet.pnl;
        }
    }
    assert!(placed > 0);
    assert_eq!(out.summary.final_balance, running);
}

#[test]
fn test_parallel_evaluation_matches_sequential() {
    let season = Season::generate(314);
    let sequential = run(&season, permissive(StakingMode::Flat { size: dec!(25) }));
    let parallel = run(
        &season,
        StrategyConfig {
            evaluation_workers: 4,
            ..permissive(StakingMode::Flat { size: dec!(25) })
        },
    );
    assert_eq!(sequential, parallel);
}

#[test]
fn test_quote_cutoff_excludes_late_prices() {
    let season = Season::generate(8);
    let out = run(
        &season,
        StrategyConfig {
            pre_kickoff_quote_cutoff: Duration::hours(1),
            ..permissive(StakingMode::Flat { size: dec!(10) })
        },
    );

    for (record, fixture) in out.bets.iter().zip(&season.fixtures) {
        if let Some(signal) = &record.signal {
            let early = season
                .quotes
                .iter()
                .find(|q| {
                    q.fixture_id == fixture.fixture_id
                        && q.observed_timestamp == fixture.kickoff_timestamp - Duration::hours(3)
                })
                .unwrap();
            assert!((signal.odds - early.decimal_odds).abs() < f64::EPSILON);
        }
        if let Some(bet) = &record.bet {
            assert_eq!(bet.placed_at, fixture.kickoff_timestamp - Duration::hours(1));
        }
    }
}

#[test]
fn test_strict_gates_record_reasons() {
    let season = Season::generate(3);
    let out = run(
        &season,
        StrategyConfig {
            min_edge_pct: 0.9,
            ..permissive(StakingMode::Flat { size: dec!(10) })
        },
    );

    assert_eq!(out.summary.placed_bets, 0);
    assert!(out.bankroll_trajectory.is_empty());
    assert!(out.summary.skipped.contains_key(&SkipReason::BelowEdge));
    for record in &out.bets {
        if record.skip_reason == Some(SkipReason::BelowEdge) {
            let signal = record.signal.as_ref().unwrap();
            assert!(!signal.passes);
            assert!(signal.edge < 0.9);
        }
    }
}

#[test]
fn test_unplayed_fixtures_are_voided() {
    let mut season = Season::generate(61);
    for f in &mut season.fixtures[24..] {
        f.settled_first_half_goals = None;
    }
    let out = run(&season, permissive(StakingMode::Flat { size: dec!(10) }));

    for record in &out.bets[24..] {
        if let Some(bet) = &record.bet {
            assert_eq!(bet.outcome, BetOutcome::Void);
            assert_eq!(bet.pnl, Decimal::ZERO);
        }
    }
    let last_settled = season.fixtures[23].kickoff_timestamp;
    assert!(
        out.bankroll_trajectory
            .iter()
            .all(|s| s.timestamp <= last_settled)
    );
}

// ── Input rejection ─────────────────────────────────────────

#[test]
fn test_unsorted_input_is_rejected() {
    let season = Season::generate(1);
    let (samples, quotes) = season.stores();
    let mut fixtures = season.fixtures.clone();
    fixtures.swap(0, 10);

    let err = BacktestRunner::new(&samples, &quotes, StrategyConfig::default())
        .run(&fixtures, dec!(1000))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsortedFixtures { .. }));
}

#[test]
fn test_negative_bankroll_is_rejected() {
    let season = Season::generate(1);
    let (samples, quotes) = season.stores();
    let err = BacktestRunner::new(&samples, &quotes, StrategyConfig::default())
        .run(&season.fixtures, dec!(-1))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration(_)));
}

#[test]
fn test_empty_input_is_a_no_op() {
    let samples = SampleStore::new();
    let quotes = QuoteBook::new();
    let out = BacktestRunner::new(&samples, &quotes, StrategyConfig::default())
        .run(&[], dec!(500))
        .unwrap();
    assert!(out.bets.is_empty());
    assert!(out.bankroll_trajectory.is_empty());
    assert_eq!(out.summary.final_balance, dec!(500));
}
