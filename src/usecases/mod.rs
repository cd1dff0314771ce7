//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the engine's workflows.
//!
//! Use cases:
//! - `FixtureEvaluator`: Estimate, project and gate one fixture
//! - `BacktestRunner`: Walk-forward lay simulation with settlement
//! - `evaluate_live`: Value signals for upcoming fixtures

pub mod backtest;
pub mod evaluation;
pub mod scanner;

pub use backtest::{BacktestOutcome, BacktestRunner, run_backtest};
pub use evaluation::{Evaluation, FixtureEvaluator};
pub use scanner::{ScanReport, evaluate_live};
