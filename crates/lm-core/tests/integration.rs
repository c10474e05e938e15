//! End-to-end scenarios through the pure engine:
//! log + governance → refresh → snapshot, across repeated invocations.

use lm_core::constants::{ABSOLUTE_CONSTRAINTS_HEADING, BLOCK_SEPARATOR, DELTA_HEADING};
use lm_core::{
    Budget, CacheState, ConstraintRules, ContextArtifact, GovernanceDocument, LogDocument,
    SnapshotOutcome, SnapshotRequest, SnapshotStatus, estimate_tokens, refresh,
};

const DATE: &str = "2026-03-01";

fn daily_note(lines: usize) -> String {
    let mut out = vec![format!("# {DATE}"), "## Events".to_string()];
    for i in 3..=lines {
        out.push(format!("- **09:{:02}** [work] step {i} of the migration", i % 60));
    }
    out.join("\n") + "\n"
}

fn governance() -> Vec<GovernanceDocument> {
    vec![
        GovernanceDocument::new(
            "SOUL.md",
            "# Soul\n\nCurious and kind.\n\n## Preferences\n- NEVER delete user files\n- likes tea",
        ),
        GovernanceDocument::new(
            "AGENTS.md",
            "# Agents\n\n## Session Protocol\n1. Read the context first.\n2. Log decisions.",
        ),
    ]
}

fn invoke(
    state: CacheState,
    text: &str,
    docs: &[GovernanceDocument],
    now: &str,
) -> (CacheState, SnapshotOutcome) {
    let log = LogDocument::new(DATE, text);
    let rules = ConstraintRules::default();
    let request = SnapshotRequest {
        log: &log,
        governance: docs,
        rules: &rules,
        budget: Budget::default(),
        now_iso: now,
    };
    refresh(state, &request)
}

fn delta_block(snapshot: &str) -> &str {
    let start = snapshot.find(DELTA_HEADING).expect("delta block present") + DELTA_HEADING.len() + 1;
    let rest = &snapshot[start..];
    let end = rest.find("\n\n## Today's note").unwrap_or(rest.len());
    &rest[..end]
}

/// Scenario: 45-line note, no prior entry → full snapshot, no delta, checkpoint 45.
#[test]
fn first_invocation_builds_full_snapshot() {
    let (state, out) = invoke(CacheState::new(), &daily_note(45), &[], "2026-03-01T08:00:00Z");

    assert_eq!(out.status, SnapshotStatus::Built);
    assert!(!out.snapshot().contains(DELTA_HEADING));
    assert!(out.snapshot().contains("step 45 of the migration"));
    assert_eq!(state.get(DATE).unwrap().last_line_count, 45);
}

/// Scenario: same note again → byte-identical output, no recomputation.
#[test]
fn unchanged_note_is_served_from_cache() {
    let docs = governance();
    let (state, first) = invoke(CacheState::new(), &daily_note(45), &docs, "2026-03-01T08:00:00Z");
    let (state, second) = invoke(state, &daily_note(45), &docs, "2026-03-01T09:30:00Z");

    assert_eq!(second.status, SnapshotStatus::Cached);
    assert_eq!(second.entry.last_updated_iso, "2026-03-01T08:00:00Z");

    let a = ContextArtifact::from_snapshot(DATE, first.snapshot(), &first.entry.last_updated_iso);
    let b = ContextArtifact::from_snapshot(DATE, second.snapshot(), &second.entry.last_updated_iso);
    assert_eq!(a, b);
    assert_eq!(state.get(DATE), Some(&first.entry));
}

/// Scenario: note grows 45 → 52 → delta holds exactly lines 46–52.
#[test]
fn growth_surfaces_exactly_the_new_lines() {
    let (state, _) = invoke(CacheState::new(), &daily_note(45), &[], "t1");
    let grown = daily_note(52);
    let (state, out) = invoke(state, &grown, &[], "t2");

    assert_eq!(out.status, SnapshotStatus::Rebuilt { with_delta: true });
    let expected: Vec<&str> = grown.lines().skip(45).collect();
    assert_eq!(expected.len(), 7);
    assert_eq!(delta_block(out.snapshot()), expected.join("\n"));
    assert_eq!(state.get(DATE).unwrap().last_line_count, 52);
}

/// Scenario: an emphasized bullet outside any matching heading is surfaced
/// under "Absolute Constraints".
#[test]
fn constraint_bullet_outside_sections_is_surfaced() {
    let (_, out) = invoke(CacheState::new(), &daily_note(10), &governance(), "t1");
    let (gov, daily) = out.snapshot().split_once(BLOCK_SEPARATOR).unwrap();

    assert!(gov.contains(&format!("{ABSOLUTE_CONSTRAINTS_HEADING}\n- NEVER delete user files")));
    assert!(gov.contains("## Session Protocol\n1. Read the context first."));
    assert!(!gov.contains("likes tea"));
    assert!(daily.contains("## Today's note (2026-03-01)"));
    // SOUL.md outranks AGENTS.md
    assert!(gov.find("(SOUL.md)").unwrap() < gov.find("(AGENTS.md)").unwrap());
}

#[test]
fn governance_change_rebuilds_without_delta() {
    let docs = governance();
    let (state, _) = invoke(CacheState::new(), &daily_note(20), &docs, "t1");
    let mut edited = docs.clone();
    edited[0].raw_text.push_str("\n- ALWAYS confirm before purchases");
    let (_, out) = invoke(state, &daily_note(20), &edited, "t2");

    assert_eq!(out.status, SnapshotStatus::Rebuilt { with_delta: false });
    assert!(out.snapshot().contains("- ALWAYS confirm before purchases"));
}

#[test]
fn nothing_to_say_yields_empty_snapshot() {
    let (state, out) = invoke(CacheState::new(), "", &[], "t1");
    assert_eq!(out.snapshot(), "");
    assert_eq!(state.get(DATE).unwrap().last_line_count, 0);
    let artifact = ContextArtifact::from_snapshot(DATE, out.snapshot(), "t1");
    assert_eq!(artifact, ContextArtifact::empty(DATE));
}

#[test]
fn oversized_inputs_stay_within_budget() {
    let huge = daily_note(2000);
    let mut docs = governance();
    docs.push(GovernanceDocument::new(
        "TOOLS.md",
        (0..500)
            .map(|i| format!("- ALWAYS run tool {i} with the safe flag enabled"))
            .collect::<Vec<_>>()
            .join("\n"),
    ));
    let (_, out) = invoke(CacheState::new(), &huge, &docs, "t1");
    let budget = Budget::default();
    assert!(estimate_tokens(out.snapshot()) <= budget.total_tokens);
    let (gov, daily) = out.snapshot().split_once(BLOCK_SEPARATOR).unwrap();
    assert!(estimate_tokens(gov) <= budget.governance_tokens());
    assert!(estimate_tokens(daily) <= budget.daily_tokens());
}
