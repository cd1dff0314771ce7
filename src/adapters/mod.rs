//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! storage. Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `memory`: In-memory sample and quote stores
//! - `snapshot`: JSON input document loader
//! - `persistence`: JSONL result sink

pub mod memory;
pub mod persistence;
pub mod snapshot;
