//! First-half Lay Engine - Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate (path from argv, default `config.toml`)
//! 2. Init tracing (JSON structured logging)
//! 3. Load the input snapshot
//! 4. Run the configured mode (backtest or scan)
//! 5. Persist results through the JSONL sink
//! 6. Log the summary

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use fh_lay_engine::adapters::persistence::JsonlResultSink;
use fh_lay_engine::adapters::snapshot::{Snapshot, load_snapshot};
use fh_lay_engine::config::{AppConfig, RunMode, loader::load_config};
use fh_lay_engine::domain::strategy::StrategyConfig;
use fh_lay_engine::ports::results::ResultSink;
use fh_lay_engine::usecases::{BacktestRunner, evaluate_live};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = load_config(&path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.run.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.run.name,
        version = env!("CARGO_PKG_VERSION"),
        mode = ?config.run.mode,
        config = %path,
        "Starting first-half lay engine"
    );

    let strategy = config.strategy()?;

    // ── 3. Load input snapshot ──────────────────────────────
    let snapshot = load_snapshot(&config.run.input).await?;

    // ── 4-6. Run, persist, report ───────────────────────────
    let sink = JsonlResultSink::new(&config.persistence.data_dir).await?;
    match config.run.mode {
        RunMode::Backtest => run_backtest_mode(&config, strategy, &snapshot, &sink).await?,
        RunMode::Scan => run_scan_mode(&config, &strategy, &snapshot, &sink).await?,
    }

    info!(output = %sink.dir().display(), "Run complete");
    Ok(())
}

async fn run_backtest_mode(
    config: &AppConfig,
    strategy: StrategyConfig,
    snapshot: &Snapshot,
    sink: &impl ResultSink,
) -> Result<()> {
    let starting_bankroll = config.starting_bankroll()?;
    let outcome = BacktestRunner::new(&snapshot.samples, &snapshot.quotes, strategy)
        .run(&snapshot.fixtures, starting_bankroll)
        .context("Backtest failed")?;

    outcome.persist(sink).await?;

    let s = &outcome.summary;
    for week in &s.weekly {
        info!(
            iso_year = week.iso_year,
            iso_week = week.iso_week,
            bets = week.bets,
            win_rate = week.win_rate,
            pnl = %week.pnl,
            roi = week.roi,
            "Week summary"
        );
    }
    info!(
        placed = s.placed_bets,
        wins = s.wins,
        losses = s.losses,
        voids = s.voids,
        skipped = ?s.skipped,
        win_rate = s.win_rate,
        total_staked = %s.total_staked,
        total_pnl = %s.total_pnl,
        roi = s.roi,
        avg_stake = %s.avg_stake,
        avg_profit_per_bet = %s.avg_profit_per_bet,
        max_drawdown = %s.max_drawdown,
        max_drawdown_pct = s.max_drawdown_pct,
        sharpe = s.sharpe_ratio,
        final_balance = %s.final_balance,
        "Backtest summary"
    );
    Ok(())
}

async fn run_scan_mode(
    config: &AppConfig,
    strategy: &StrategyConfig,
    snapshot: &Snapshot,
    sink: &impl ResultSink,
) -> Result<()> {
    let now = config.run.now.unwrap_or_else(Utc::now);
    let report = evaluate_live(
        &snapshot.fixtures,
        &snapshot.samples,
        &snapshot.quotes,
        strategy,
        now,
    )
    .context("Live scan failed")?;

    report.persist(sink).await?;

    for signal in &report.signals {
        info!(
            fixture = %signal.fixture_id,
            probability = signal.projected_probability,
            implied = signal.implied_probability,
            edge = signal.edge,
            odds = signal.odds,
            fair_odds = ?signal.fair_odds,
            "Value signal"
        );
    }
    info!(
        as_of = %report.as_of,
        signals = report.signals.len(),
        skipped = report.skipped.len(),
        "Scan summary"
    );
    Ok(())
}
