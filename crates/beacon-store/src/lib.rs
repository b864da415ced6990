//! SQLite store for the beacon analytics backend.
//!
//! This crate is the sole path to persistent state. Every statement is
//! parameterized; the core pipeline reaches the store only through the
//! [`beacon_core::LogSink`] seam.
//!
//! Deduplication is enforced here, not in application code: `logs` carries a
//! uniqueness constraint on `(project_id, data_hash)` and inserts are
//! `INSERT OR IGNORE`, so concurrent identical submissions race safely at
//! the store level.

mod schema;
mod store;

pub use store::{LogRow, ProjectSummary, SqliteStore};
