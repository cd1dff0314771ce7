//! Domain layer - projection, value detection and staking.
//!
//! Pure, synchronous logic over plain records. No I/O, no clocks, no
//! ambient randomness: every generator is seeded from the strategy config.

pub mod error;
pub mod kelly;
pub mod metrics;
pub mod projection;
pub mod sampling;
pub mod staking;
pub mod strategy;
pub mod types;
pub mod value;

// Re-export core types for convenience
pub use error::EngineError;
pub use kelly::LayKelly;
pub use metrics::{BacktestSummary, WeeklySummary, calculate_summary};
pub use projection::{Projection, project, project_estimates};
pub use sampling::SampleBuilder;
pub use staking::{BankrollLedger, StakingEngine};
pub use strategy::{StakingMode, StrategyConfig};
pub use types::{
    BankrollState, Bet, BetOutcome, BetRecord, Fixture, FixtureId, MarketQuote, QuoteSide, Role, Sample,
    SkipReason, TeamId, TeamRateEstimate, ValueSignal,
};
