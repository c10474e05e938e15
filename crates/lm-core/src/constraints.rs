//! Priority-constraint extraction from governance documents.
//!
//! The policy (which headings and bullets count as constraints) lives in
//! [`ConstraintRules`], separate from the scanning algorithm, so it can be
//! tested and swapped on its own.

use std::collections::HashSet;

use crate::constants::ABSOLUTE_CONSTRAINTS_HEADING;
use crate::text::{heading_level, heading_title, normalize, trim_blank_lines};

/// A named reference document (rules, long-term facts, protocols, tools).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceDocument {
    pub name: String,
    pub raw_text: String,
}

impl GovernanceDocument {
    pub fn new(name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Governance files in priority order, with the label shown in the snapshot.
pub const GOVERNANCE_FILES: &[(&str, &str)] = &[
    ("SOUL.md", "Core Rules"),
    ("AGENTS.md", "Operating Protocols"),
    ("MEMORY.md", "Long-term Memory"),
    ("TOOLS.md", "Tool Notes"),
];

/// Friendly label for a governance file; unknown files use their own name.
pub fn governance_label(name: &str) -> &str {
    GOVERNANCE_FILES
        .iter()
        .find(|(file, _)| *file == name)
        .map(|(_, label)| *label)
        .unwrap_or(name)
}

fn governance_rank(name: &str) -> usize {
    GOVERNANCE_FILES
        .iter()
        .position(|(file, _)| *file == name)
        .unwrap_or(GOVERNANCE_FILES.len())
}

/// A heading-delimited section whose title matched a priority keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSection {
    pub title: String,
    /// The original heading line, kept verbatim for rendering.
    heading: String,
    pub body: String,
}

/// Keyword policy for constraint extraction.
#[derive(Debug, Clone)]
pub struct ConstraintRules {
    /// Matched case-insensitively against heading titles.
    pub section_keywords: Vec<String>,
    /// Matched case-sensitively inside bullet lines.
    pub bullet_keywords: Vec<String>,
    /// Prefixes (after indentation) that make a line a list item.
    pub bullet_markers: Vec<String>,
}

impl Default for ConstraintRules {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            section_keywords: owned(&[
                "boundar", "protocol", "safe", "never", "prohibit", "forbidden", "constraint",
                "rule", "critical", "⚠", "🚫", "⛔", "❌",
            ]),
            bullet_keywords: owned(&[
                "NEVER", "ALWAYS", "MUST", "DO NOT", "DON'T", "FORBIDDEN", "CRITICAL", "⚠", "🚫",
                "⛔",
            ]),
            bullet_markers: owned(&["- ", "* ", "+ "]),
        }
    }
}

impl ConstraintRules {
    pub fn section_matches(&self, title: &str) -> bool {
        let lower = title.to_lowercase();
        self.section_keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
    }

    pub fn is_bullet(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.bullet_markers.iter().any(|m| trimmed.starts_with(m.as_str()))
    }

    pub fn bullet_matches(&self, line: &str) -> bool {
        self.is_bullet(line)
            && self
                .bullet_keywords
                .iter()
                .any(|k| line.contains(k.as_str()))
    }
}

/// Everything captured from a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentConstraints {
    pub sections: Vec<ConstraintSection>,
    /// Strong-constraint bullets found outside captured sections, deduplicated.
    pub bullets: Vec<String>,
}

impl DocumentConstraints {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.bullets.is_empty()
    }

    /// Sections in document order, then the synthesized bullet list.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = self
            .sections
            .iter()
            .map(|s| {
                if s.body.is_empty() {
                    s.heading.clone()
                } else {
                    format!("{}\n{}", s.heading, s.body)
                }
            })
            .collect();
        if !self.bullets.is_empty() {
            parts.push(format!(
                "{ABSOLUTE_CONSTRAINTS_HEADING}\n{}",
                self.bullets.join("\n")
            ));
        }
        parts.join("\n\n")
    }
}

struct OpenSection<'a> {
    level: usize,
    heading: &'a str,
    lines: Vec<&'a str>,
}

impl OpenSection<'_> {
    fn close(self) -> ConstraintSection {
        ConstraintSection {
            title: heading_title(self.heading).to_string(),
            heading: self.heading.trim().to_string(),
            body: trim_blank_lines(&self.lines),
        }
    }
}

/// Scan one document for matching sections and strong-constraint bullets.
///
/// A matching section runs until the next heading of equal or higher level;
/// deeper headings inside it are captured as part of its body.
pub fn extract_constraints(text: &str, rules: &ConstraintRules) -> DocumentConstraints {
    let text = normalize(text);
    let mut out = DocumentConstraints::default();
    let mut seen_bullets: HashSet<String> = HashSet::new();
    let mut open: Option<OpenSection<'_>> = None;

    for line in text.lines() {
        if let Some(level) = heading_level(line) {
            if open.as_ref().is_some_and(|s| level <= s.level)
                && let Some(section) = open.take()
            {
                out.sections.push(section.close());
            }
            if let Some(section) = open.as_mut() {
                section.lines.push(line);
            } else if rules.section_matches(heading_title(line)) {
                open = Some(OpenSection {
                    level,
                    heading: line,
                    lines: Vec::new(),
                });
            }
            continue;
        }

        if let Some(section) = open.as_mut() {
            section.lines.push(line);
            continue;
        }

        if rules.bullet_matches(line) {
            let bullet = line.trim().to_string();
            if seen_bullets.insert(bullet.clone()) {
                out.bullets.push(bullet);
            }
        }
    }

    if let Some(section) = open.take() {
        out.sections.push(section.close());
    }
    out
}

/// Extract constraints from every document and concatenate them, each under
/// its friendly label, in fixed priority order. Documents with no matches
/// contribute nothing.
pub fn extract_governance(docs: &[GovernanceDocument], rules: &ConstraintRules) -> String {
    let mut ordered: Vec<&GovernanceDocument> = docs.iter().collect();
    ordered.sort_by_key(|d| governance_rank(&d.name));

    ordered
        .into_iter()
        .filter_map(|doc| {
            let extracted = extract_constraints(&doc.raw_text, rules);
            if extracted.is_empty() {
                return None;
            }
            Some(format!(
                "### {} ({})\n{}",
                governance_label(&doc.name),
                doc.name,
                extracted.render()
            ))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
