//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `SampleSource` / `QuoteSource`: Synchronous record reads
//! - `ResultSink`: Run output persistence (JSONL-based)

pub mod results;
pub mod sources;
