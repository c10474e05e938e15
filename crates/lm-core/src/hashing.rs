//! Content fingerprints and the cache-hit decision.

use sha2::{Digest, Sha256};

use crate::cache::CacheEntry;

/// Lowercase hex SHA-256 of a string.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The three hashes that identify one day's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub note_hash: String,
    pub governance_hash: String,
    pub combined_hash: String,
}

impl Fingerprint {
    /// `normalized_note` must already have unified line endings.
    pub fn compute(normalized_note: &str, governance_text: &str) -> Self {
        let note_hash = sha256_hex(normalized_note);
        let governance_hash = sha256_hex(governance_text);
        let combined_hash = combine(&note_hash, &governance_hash);
        Self {
            note_hash,
            governance_hash,
            combined_hash,
        }
    }
}

/// Deterministic combination of the note and governance hashes.
pub fn combine(note_hash: &str, governance_hash: &str) -> String {
    sha256_hex(&format!("{note_hash}:{governance_hash}"))
}

/// Outcome of comparing fresh inputs against the stored entry for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Stored snapshot is valid; return it untouched.
    Hit,
    /// No entry exists for today.
    Miss,
    /// Inputs changed since the stored snapshot.
    Changed,
    /// The note lost lines since the checkpoint; rebuild without a delta.
    Shrunk,
}

impl GateDecision {
    pub fn is_hit(self) -> bool {
        self == GateDecision::Hit
    }
}

/// Cache hit requires an equal combined hash and an unchanged line count.
/// A shrinking line count always forces a rebuild, even on an equal hash.
pub fn gate(prior: Option<&CacheEntry>, fingerprint: &Fingerprint, line_count: usize) -> GateDecision {
    let Some(prior) = prior else {
        return GateDecision::Miss;
    };
    if line_count < prior.last_line_count {
        return GateDecision::Shrunk;
    }
    if prior.combined_hash == fingerprint.combined_hash && line_count == prior.last_line_count {
        GateDecision::Hit
    } else {
        GateDecision::Changed
    }
}
