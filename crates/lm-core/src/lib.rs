//! Life-memory context snapshot engine.
//!
//! Turns today's log plus a handful of governance documents into a bounded
//! digest for an agent's context window. Change detection is content-hash
//! based, new lines since the last checkpoint are surfaced as a delta, and
//! truncation never splits a line or drops a structural marker.
//!
//! Zero I/O: callers supply text and an explicit cache state, and persist
//! whatever state comes back.

pub mod artifact;
pub mod budget;
pub mod cache;
pub mod constants;
pub mod constraints;
pub mod delta;
pub mod hashing;
pub mod snapshot;
pub mod text;
pub mod truncate;

pub use artifact::{ARTIFACT_NAME, ArtifactKind, ContextArtifact, ERROR_ARTIFACT_NAME};
pub use budget::{Budget, DailyContent, assemble, compose_daily, compose_governance};
pub use cache::{CacheEntry, CacheState, ParsedState};
pub use constants::{DEFAULT_TOKEN_BUDGET, TRUNCATION_MARKER};
pub use constraints::{
    ConstraintRules, ConstraintSection, GOVERNANCE_FILES, GovernanceDocument,
    extract_constraints, extract_governance,
};
pub use delta::extract_delta;
pub use hashing::{Fingerprint, GateDecision, gate, sha256_hex};
pub use snapshot::{LogDocument, SnapshotOutcome, SnapshotRequest, SnapshotStatus, refresh};
pub use text::{estimate_tokens, is_calendar_day, normalize, trim_to_chars};
pub use truncate::{StructuralParts, truncate_structural};
