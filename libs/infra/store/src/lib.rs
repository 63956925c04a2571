//! Per-profile durable persistence (§4.B). `Store` wraps a pooled,
//! file-backed SQLite connection: upsert by fingerprint with field-wise
//! merge, compare-and-swap status transitions, filtered queries, and
//! aggregate stats. Safe to call from multiple workers in one process and
//! from multiple processes against the same database file.

pub mod error;
pub mod filter;
pub mod row;
pub mod run_log;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use filter::JobFilter;
pub use run_log::{RunKind, RunLogEntry};
pub use store::{ScoreUpdate, Store, StoreStats, UpsertOutcome};
