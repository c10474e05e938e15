//! Per-day cache entries and the in-memory mapping that gets persisted.
//!
//! The mapping is an explicit value: loaded once at the start of an
//! invocation, threaded through [`crate::snapshot::refresh`], and saved at
//! the end. Nothing here touches the filesystem.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One calendar day's cached snapshot and checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub note_hash: String,
    pub governance_hash: String,
    pub combined_hash: String,
    pub snapshot: String,
    /// Line count of the note that produced `snapshot`.
    pub last_line_count: usize,
    pub last_updated_iso: String,
}

/// Mapping from `YYYY-MM-DD` to that day's entry. Entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheState {
    entries: BTreeMap<String, CacheEntry>,
}

/// Result of lenient parsing: the usable state plus what had to be dropped.
#[derive(Debug, Default)]
pub struct ParsedState {
    pub state: CacheState,
    /// Keys whose values did not match the entry shape.
    pub dropped: Vec<String>,
    /// Set when the document as a whole was unusable.
    pub corrupt: Option<String>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: &str) -> Option<&CacheEntry> {
        self.entries.get(date)
    }

    /// Insert or overwrite the entry for `date`.
    pub fn put(&mut self, date: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(date.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse persisted JSON without ever failing.
    ///
    /// Malformed documents yield an empty state. Inside a well-formed object,
    /// entries that do not match the shape are dropped individually and
    /// unknown fields inside entries are ignored.
    pub fn parse_lenient(json: &str) -> ParsedState {
        let value: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                return ParsedState {
                    corrupt: Some(format!("invalid JSON: {e}")),
                    ..ParsedState::default()
                };
            }
        };
        let Value::Object(map) = value else {
            return ParsedState {
                corrupt: Some("top-level value is not an object".to_string()),
                ..ParsedState::default()
            };
        };

        let mut parsed = ParsedState::default();
        for (date, raw) in map {
            match serde_json::from_value::<CacheEntry>(raw) {
                Ok(entry) => parsed.state.put(date, entry),
                Err(_) => parsed.dropped.push(date),
            }
        }
        parsed
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CacheEntry {
        CacheEntry {
            note_hash: "n".into(),
            governance_hash: "g".into(),
            combined_hash: "c".into(),
            snapshot: "hello".into(),
            last_line_count: 3,
            last_updated_iso: "2026-03-01T09:00:00Z".into(),
        }
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let mut state = CacheState::new();
        state.put("2026-03-01", sample());
        let json = state.to_json_pretty().unwrap();
        assert!(json.contains("\"2026-03-01\""));
        assert!(json.contains("\"noteHash\""));
        assert!(json.contains("\"lastLineCount\": 3"));
        assert!(json.contains("\"lastUpdatedIso\""));
    }

    #[test]
    fn test_parse_tolerates_extra_keys() {
        let json = r#"{
            "2026-03-01": {
                "noteHash": "n", "governanceHash": "g", "combinedHash": "c",
                "snapshot": "hello", "lastLineCount": 3,
                "lastUpdatedIso": "2026-03-01T09:00:00Z",
                "futureField": [1, 2, 3]
            }
        }"#;
        let parsed = CacheState::parse_lenient(json);
        assert!(parsed.corrupt.is_none());
        assert_eq!(parsed.state.get("2026-03-01"), Some(&sample()));
    }

    #[test]
    fn test_parse_invalid_json_is_empty() {
        let parsed = CacheState::parse_lenient("{not json");
        assert!(parsed.state.is_empty());
        assert!(parsed.corrupt.is_some());
    }

    #[test]
    fn test_parse_non_object_is_empty() {
        let parsed = CacheState::parse_lenient("[1, 2]");
        assert!(parsed.state.is_empty());
        assert!(parsed.corrupt.is_some());
    }

    #[test]
    fn test_parse_drops_only_bad_entries() {
        let json = r#"{
            "2026-03-01": {
                "noteHash": "n", "governanceHash": "g", "combinedHash": "c",
                "snapshot": "hello", "lastLineCount": 3,
                "lastUpdatedIso": "2026-03-01T09:00:00Z"
            },
            "2026-03-02": {"snapshot": 42}
        }"#;
        let parsed = CacheState::parse_lenient(json);
        assert_eq!(parsed.state.len(), 1);
        assert_eq!(parsed.dropped, vec!["2026-03-02".to_string()]);
    }
}
