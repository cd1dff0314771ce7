//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the `ResultSink` port with plain files: line-per-record
//! JSONL for bets, bankroll states and signals, pretty JSON for the
//! summary. No database dependency.

pub mod jsonl;

pub use jsonl::JsonlResultSink;
