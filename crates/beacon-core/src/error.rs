//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the pipeline.
///
/// Validation failures are not errors; they are reported as
/// [`IngestOutcome::Rejected`](crate::IngestOutcome) with a [`RejectReason`].
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid process configuration (e.g. an empty pepper).
    #[error("configuration error: {0}")]
    Config(String),

    /// The log store failed. Never retried by the pipeline.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a beacon was rejected.
///
/// Every variant is terminal for the request: no retry, no partial
/// acceptance. Duplicate submissions are NOT a rejection; they resolve to
/// the same success as a fresh insert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No visitor IP could be determined from the request.
    #[error("unable to determine visitor identity")]
    MissingVisitorIdentity,

    /// `project_id` or `data` absent or empty.
    #[error("missing projectId or data")]
    MissingField,

    /// Canonical payload string exceeds the configured byte ceiling.
    #[error("payload of {actual} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// The configured ceiling.
        limit: usize,
        /// Byte length of the canonical payload string.
        actual: usize,
    },

    /// A string submission did not parse as JSON.
    #[error("invalid JSON format: {0}")]
    MalformedJson(String),

    /// Required payload fields absent, listed in declared order.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingPayloadFields(Vec<&'static str>),
}
