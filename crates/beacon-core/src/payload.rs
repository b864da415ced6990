//! Inbound payload representations and normalization.

use serde_json::Value;

/// An inbound `data` field before normalization.
///
/// Clients submit beacons in two shapes: a pre-encoded JSON string (the
/// query-parameter endpoint) or a structured JSON value (request bodies).
/// Both collapse into one canonical form here; downstream code never
/// branches on the original shape again.
#[derive(Debug, Clone)]
pub enum PayloadRepresentation {
    /// A string the client claims is JSON. Used verbatim as the canonical
    /// form once it parses.
    RawString(String),
    /// An already-structured value. Serialized once to produce the canonical
    /// form; stable key ordering is not required.
    Structured(Value),
}

impl PayloadRepresentation {
    /// Whether the payload counts as absent for the presence check.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::RawString(s) => s.is_empty(),
            Self::Structured(v) => v.is_null(),
        }
    }

    /// The canonical string form: raw strings verbatim, structured values
    /// serialized once.
    ///
    /// This string is what gets persisted in `data` and hashed into
    /// `data_hash`. Two semantically identical payloads submitted in
    /// different shapes may therefore produce different hashes;
    /// deduplication is syntactic, not semantic.
    pub fn to_canonical_string(&self) -> String {
        match self {
            Self::RawString(s) => s.clone(),
            Self::Structured(v) => {
                serde_json::to_string(v).unwrap_or_else(|_| "null".to_string())
            }
        }
    }
}

/// A payload that passed validation: the canonical string that gets stored
/// and hashed, plus its parsed form for field extraction.
#[derive(Debug, Clone)]
pub struct CanonicalPayload {
    /// Canonical string form, persisted as `data`.
    pub canonical: String,
    /// Parsed structured form.
    pub parsed: Value,
}
