use serde::{Deserialize, Serialize};

/// Virtual file name of a successful (or empty) context artifact.
pub const ARTIFACT_NAME: &str = "LIFE_CONTEXT.md";
/// Virtual file name used when the pipeline failed.
pub const ERROR_ARTIFACT_NAME: &str = "LIFE_CONTEXT_ERROR.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Snapshot,
    Empty,
    Error,
}

/// The text file handed back to the calling runtime. Exactly one kind is
/// produced per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub content: String,
}

impl ContextArtifact {
    /// Wrap an assembled snapshot. An empty snapshot yields the empty-state
    /// artifact instead.
    pub fn from_snapshot(date: &str, snapshot: &str, updated_iso: &str) -> Self {
        if snapshot.trim().is_empty() {
            return Self::empty(date);
        }
        Self {
            name: ARTIFACT_NAME.to_string(),
            kind: ArtifactKind::Snapshot,
            content: format!(
                "# Life Context ({date})\n\n{snapshot}\n\n---\n_Snapshot as of {updated_iso}. \
                 Open today's note for full detail._\n"
            ),
        }
    }

    pub fn empty(date: &str) -> Self {
        Self {
            name: ARTIFACT_NAME.to_string(),
            kind: ArtifactKind::Empty,
            content: format!(
                "# Life Context ({date})\n\nNo entries yet for today. \
                 Log an event to start the daily note.\n"
            ),
        }
    }

    pub fn error(reason: &str) -> Self {
        Self {
            name: ERROR_ARTIFACT_NAME.to_string(),
            kind: ArtifactKind::Error,
            content: format!(
                "# Life Context unavailable\n\nThe context snapshot could not be built: {reason}\n\n\
                 Continue without daily context. Run `lm bootstrap --verbose` to diagnose.\n"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_artifact_wraps_content() {
        let a = ContextArtifact::from_snapshot("2026-03-01", "body", "2026-03-01T08:00:00Z");
        assert_eq!(a.kind, ArtifactKind::Snapshot);
        assert_eq!(a.name, ARTIFACT_NAME);
        assert!(a.content.starts_with("# Life Context (2026-03-01)\n\nbody\n"));
        assert!(a.content.contains("2026-03-01T08:00:00Z"));
    }

    #[test]
    fn test_blank_snapshot_becomes_empty_state() {
        let a = ContextArtifact::from_snapshot("2026-03-01", "  \n", "x");
        assert_eq!(a, ContextArtifact::empty("2026-03-01"));
    }

    #[test]
    fn test_error_artifact_is_distinct() {
        let a = ContextArtifact::error("vault missing");
        assert_eq!(a.kind, ArtifactKind::Error);
        assert_eq!(a.name, ERROR_ARTIFACT_NAME);
        assert!(a.content.contains("vault missing"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ContextArtifact::empty("2026-03-01")).unwrap();
        assert!(json.contains("\"kind\":\"empty\""));
    }
}
