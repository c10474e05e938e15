//! The per-invocation snapshot engine.
//!
//! `refresh` is a pure function over an explicit [`CacheState`]: the caller
//! loads the state, passes it in, and persists whatever comes back.

use crate::budget::{Budget, DailyContent, assemble};
use crate::cache::{CacheEntry, CacheState};
use crate::constraints::{ConstraintRules, GovernanceDocument, extract_governance};
use crate::delta::extract_delta;
use crate::hashing::{Fingerprint, GateDecision, gate};
use crate::text::{char_len, line_count, normalize};

/// One calendar day's log as fetched by a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDocument {
    /// `YYYY-MM-DD`
    pub date: String,
    pub raw_text: String,
}

impl LogDocument {
    pub fn new(date: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Everything needed to produce one day's snapshot.
pub struct SnapshotRequest<'a> {
    pub log: &'a LogDocument,
    pub governance: &'a [GovernanceDocument],
    pub rules: &'a ConstraintRules,
    pub budget: Budget,
    /// Timestamp recorded on a rebuilt entry.
    pub now_iso: &'a str,
}

/// How the returned snapshot was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// First run for the day.
    Built,
    /// Inputs unchanged; stored snapshot returned as-is.
    Cached,
    /// Inputs changed since the stored snapshot.
    Rebuilt { with_delta: bool },
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Built => "built",
            SnapshotStatus::Cached => "cached",
            SnapshotStatus::Rebuilt { with_delta: true } => "rebuilt-with-delta",
            SnapshotStatus::Rebuilt { with_delta: false } => "rebuilt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub status: SnapshotStatus,
    /// The entry now stored for the date (unchanged on a cache hit).
    pub entry: CacheEntry,
}

impl SnapshotOutcome {
    pub fn snapshot(&self) -> &str {
        &self.entry.snapshot
    }
}

/// Return today's snapshot, rebuilding only when the inputs changed.
///
/// On a hit the state is returned untouched and no extraction or truncation
/// runs. A stored snapshot larger than the current budget is never served.
pub fn refresh(mut state: CacheState, request: &SnapshotRequest<'_>) -> (CacheState, SnapshotOutcome) {
    let date = request.log.date.as_str();
    let note = normalize(&request.log.raw_text);
    let lines = line_count(&note);
    let governance_text = extract_governance(request.governance, request.rules);
    let fingerprint = Fingerprint::compute(&note, &governance_text);

    let prior = state.get(date).cloned();
    let mut decision = gate(prior.as_ref(), &fingerprint, lines);
    if decision.is_hit()
        && let Some(entry) = prior.as_ref()
    {
        if char_len(&entry.snapshot) <= request.budget.total_chars() {
            let outcome = SnapshotOutcome {
                status: SnapshotStatus::Cached,
                entry: entry.clone(),
            };
            return (state, outcome);
        }
        decision = GateDecision::Changed;
    }

    let delta = match decision {
        GateDecision::Shrunk => String::new(),
        _ => extract_delta(prior.as_ref(), &note),
    };
    let daily = DailyContent {
        date,
        note: &note,
        delta: &delta,
    };
    let snapshot = assemble(request.budget, &governance_text, &daily);

    let entry = CacheEntry {
        note_hash: fingerprint.note_hash,
        governance_hash: fingerprint.governance_hash,
        combined_hash: fingerprint.combined_hash,
        snapshot,
        last_line_count: lines,
        last_updated_iso: request.now_iso.to_string(),
    };
    let status = match decision {
        GateDecision::Miss => SnapshotStatus::Built,
        _ => SnapshotStatus::Rebuilt {
            with_delta: !delta.is_empty(),
        },
    };
    state.put(date, entry.clone());
    (state, SnapshotOutcome { status, entry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DELTA_HEADING;

    fn lines(n: usize) -> String {
        (1..=n)
            .map(|i| format!("- entry {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run(state: CacheState, text: &str, now: &str) -> (CacheState, SnapshotOutcome) {
        let log = LogDocument::new("2026-03-01", text);
        let rules = ConstraintRules::default();
        let request = SnapshotRequest {
            log: &log,
            governance: &[],
            rules: &rules,
            budget: Budget::default(),
            now_iso: now,
        };
        refresh(state, &request)
    }

    #[test]
    fn test_first_run_builds_and_checkpoints() {
        let (state, out) = run(CacheState::new(), &lines(5), "t1");
        assert_eq!(out.status, SnapshotStatus::Built);
        assert_eq!(out.entry.last_line_count, 5);
        assert_eq!(state.get("2026-03-01"), Some(&out.entry));
        assert!(!out.snapshot().contains(DELTA_HEADING));
    }

    #[test]
    fn test_unchanged_input_is_cached() {
        let (state, first) = run(CacheState::new(), &lines(5), "t1");
        let (_, second) = run(state, &lines(5), "t2");
        assert_eq!(second.status, SnapshotStatus::Cached);
        assert_eq!(second.entry.last_updated_iso, "t1");
        assert_eq!(second.snapshot(), first.snapshot());
    }

    #[test]
    fn test_crlf_does_not_bust_cache() {
        let (state, _) = run(CacheState::new(), "a\nb", "t1");
        let (_, out) = run(state, "a\r\nb", "t2");
        assert_eq!(out.status, SnapshotStatus::Cached);
    }

    #[test]
    fn test_growth_rebuilds_with_delta() {
        let (state, _) = run(CacheState::new(), &lines(3), "t1");
        let (_, out) = run(state, &lines(5), "t2");
        assert_eq!(out.status, SnapshotStatus::Rebuilt { with_delta: true });
        assert!(
            out.snapshot()
                .contains(&format!("{DELTA_HEADING}\n- entry 4\n- entry 5"))
        );
        assert_eq!(out.entry.last_line_count, 5);
    }

    #[test]
    fn test_shrink_rebuilds_without_delta_and_resets_checkpoint() {
        let (state, _) = run(CacheState::new(), &lines(6), "t1");
        let (_, out) = run(state, &lines(4), "t2");
        assert_eq!(out.status, SnapshotStatus::Rebuilt { with_delta: false });
        assert_eq!(out.entry.last_line_count, 4);
    }

    #[test]
    fn test_edit_without_growth_rebuilds_without_delta() {
        let (state, _) = run(CacheState::new(), "- a\n- b", "t1");
        let (_, out) = run(state, "- a\n- c", "t2");
        assert_eq!(out.status, SnapshotStatus::Rebuilt { with_delta: false });
        assert!(out.snapshot().contains("- c"));
    }

    #[test]
    fn test_other_days_untouched() {
        let mut state = CacheState::new();
        state.put("2026-02-28", CacheEntry::default());
        let (state, _) = run(state, &lines(2), "t1");
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("2026-02-28"), Some(&CacheEntry::default()));
    }
}
