//! Keyed digest used for visitor identity and payload deduplication.

use hex::ToHex;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// SHA-256 hasher keyed with a server-held pepper.
///
/// One digest function serves two domains: hashing a visitor IP into a
/// stable, non-reversible `uid`, and hashing the canonical payload string
/// into the `data_hash` deduplication key. The domains share the pepper but
/// are stored in different columns and never compared to each other.
///
/// The pepper is appended to the input before digesting, so the output is
/// stable for a given (input, pepper) pair and cannot be inverted by a
/// dictionary over inputs alone.
#[derive(Debug, Clone)]
pub struct PepperedHasher {
    pepper: String,
}

impl PepperedHasher {
    /// Create a hasher. Fails when `pepper` is empty: the pepper is
    /// mandatory secret-bound salt, and omitting it is a deployment defect
    /// rather than a per-request condition.
    pub fn new(pepper: impl Into<String>) -> Result<Self> {
        let pepper = pepper.into();
        if pepper.is_empty() {
            return Err(Error::Config("pepper must not be empty".to_string()));
        }
        Ok(Self { pepper })
    }

    /// Lowercase hex SHA-256 of `input` with the pepper appended.
    pub fn digest(&self, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hasher.update(self.pepper.as_bytes());
        hasher.finalize().encode_hex::<String>()
    }
}

/// Whether `s` looks like a lowercase hex SHA-256 digest.
pub fn is_sha256_hex(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 64 {
        return false;
    }
    bytes.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
