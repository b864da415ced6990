//! Core types and the ingestion pipeline for the beacon analytics backend.
//!
//! This crate provides:
//! - Keyed SHA-256 hashing for visitor identity and payload deduplication
//! - Structural validation of inbound beacons
//! - Normalization of string/structured payload representations
//! - The ingestion pipeline orchestrating the above plus the idempotent insert
//!
//! # Architecture
//!
//! ```text
//! [HTTP route] → [IngestPipeline] → [LogSink]
//!                   │ hash visitor IP → uid
//!                   │ validate + normalize payload
//!                   │ hash canonical string → data_hash
//!                   └ insert-if-absent on (project_id, data_hash)
//! ```
//!
//! The pipeline never opens a store connection itself; all persistent state
//! is reached through the [`LogSink`] seam.

mod error;
mod hash;
mod payload;
mod pipeline;
mod validate;

// ═══════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════

/// Per-row cap applied to `time_on_page` by the total-time aggregate, in
/// milliseconds (three hours). Widgets left open in background tabs report
/// arbitrarily large dwell times; rows above the cap count as the cap.
pub const TIME_ON_PAGE_CAP_MS: i64 = 10_800_000;

pub use error::{Error, RejectReason, Result};
pub use hash::{PepperedHasher, is_sha256_hex};
pub use payload::{CanonicalPayload, PayloadRepresentation};
pub use pipeline::{IngestOutcome, IngestPipeline, IngestRequest, LogKind, LogSink, NewLogEntry};
pub use validate::{REQUIRED_PAYLOAD_FIELDS, validate};
