//! Structure-preserving truncation.
//!
//! Oversized text is cut on whole-line boundaries only. Structural markers
//! (tasks, `[[cross references]]`, `#labels`, comment blocks) are collected
//! from the entire input and re-emitted in dedicated sections, so they
//! survive even when the narrative around them is dropped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{EXCERPT_SHARE_PERCENT, TRUNCATION_MARKER};
use crate::text::{char_len, heading_level, normalize, trim_to_chars};

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+] \[[ xX/-]\]").unwrap());
static CROSS_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[[^\[\]\n]+\]\]").unwrap());
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(#[A-Za-z][\w/-]*)").unwrap());

pub const TASKS_HEADING: &str = "### Tasks";
pub const LINKS_HEADING: &str = "### Linked notes";
pub const LABELS_HEADING: &str = "### Tags";
pub const COMMENTS_HEADING: &str = "### Comments";

/// Structural markers found anywhere in a document, each list deduplicated
/// and in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralParts {
    pub tasks: Vec<String>,
    pub cross_references: Vec<String>,
    pub labels: Vec<String>,
    pub comments: Vec<String>,
}

impl StructuralParts {
    pub fn collect(lines: &[&str]) -> Self {
        let mut parts = StructuralParts::default();
        let mut seen_refs: HashSet<&str> = HashSet::new();
        let mut seen_labels: HashSet<&str> = HashSet::new();

        for line in lines {
            if TASK_LINE.is_match(line) {
                parts.tasks.push(line.trim_end().to_string());
            }
            for m in CROSS_REFERENCE.find_iter(line) {
                if seen_refs.insert(m.as_str()) {
                    parts.cross_references.push(m.as_str().to_string());
                }
            }
            if heading_level(line).is_none() {
                for cap in LABEL.captures_iter(line) {
                    let label = cap.get(1).map_or("", |m| m.as_str());
                    if !label.is_empty() && seen_labels.insert(label) {
                        parts.labels.push(label.to_string());
                    }
                }
            }
        }
        parts.comments = comment_lines(lines);
        parts
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.cross_references.is_empty()
            && self.labels.is_empty()
            && self.comments.is_empty()
    }

    /// Non-empty sections, each under its own heading.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();
        if !self.tasks.is_empty() {
            sections.push(format!("{TASKS_HEADING}\n{}", self.tasks.join("\n")));
        }
        if !self.cross_references.is_empty() {
            sections.push(format!("{LINKS_HEADING}\n{}", bulleted(&self.cross_references)));
        }
        if !self.labels.is_empty() {
            sections.push(format!("{LABELS_HEADING}\n{}", bulleted(&self.labels)));
        }
        if !self.comments.is_empty() {
            sections.push(format!("{COMMENTS_HEADING}\n{}", self.comments.join("\n")));
        }
        sections.join("\n\n")
    }
}

fn bulleted(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lines inside or delimiting `%% ... %%` and `<!-- ... -->` blocks.
fn comment_lines(lines: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_percent = false;
    let mut in_html = false;

    for line in lines {
        let percent_marks = line.matches("%%").count();
        let open = line.rfind("<!--");
        let close = line.rfind("-->");
        if in_percent || in_html || percent_marks > 0 || open.is_some() || close.is_some() {
            out.push(line.trim_end().to_string());
        }
        if percent_marks % 2 == 1 {
            in_percent = !in_percent;
        }
        match (open, close) {
            (Some(o), Some(c)) => in_html = o > c,
            (Some(_), None) => in_html = true,
            (None, Some(_)) => in_html = false,
            (None, None) => {}
        }
    }
    out
}

/// Headings in `lines`, first occurrence of each, in document order.
fn heading_trail<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    lines
        .iter()
        .copied()
        .filter(|line| heading_level(line).is_some() && seen.insert(line.trim()))
        .collect()
}

/// Maximal suffix of whole lines that fits in `limit` together with the
/// trail of headings before its first line.
///
/// The suffix is never cut to make room for the trail. When the full trail
/// leaves no room for even the newest line, the oldest headings go first.
fn excerpt_with_trail(lines: &[&str], limit: usize) -> String {
    // Each line pays for its newline; the last one does not need it.
    let room = limit + 1;
    let cost = |line: &str| char_len(line) + 1;

    // trail_cost[i]: cost of the heading trail of lines[..i].
    let mut trail_cost = Vec::with_capacity(lines.len() + 1);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut acc = 0usize;
    trail_cost.push(0);
    for line in lines {
        if heading_level(line).is_some() && seen.insert(line.trim()) {
            acc += cost(line);
        }
        trail_cost.push(acc);
    }

    // Suffix plus trail never shrinks as the start moves back, so the first
    // overflow ends the scan.
    let mut start = lines.len();
    let mut suffix = 0usize;
    for idx in (0..lines.len()).rev() {
        let grown = suffix + cost(lines[idx]);
        if grown + trail_cost[idx] > room {
            break;
        }
        suffix = grown;
        start = idx;
    }
    if start < lines.len() {
        let mut out = heading_trail(&lines[..start]);
        out.extend(&lines[start..]);
        return out.join("\n");
    }

    for idx in (0..lines.len()).rev() {
        let grown = suffix + cost(lines[idx]);
        if grown > room {
            break;
        }
        suffix = grown;
        start = idx;
    }
    if start == lines.len() {
        return String::new();
    }
    let mut left = room - suffix;
    let mut out: Vec<&str> = Vec::new();
    for heading in heading_trail(&lines[..start]).into_iter().rev() {
        if cost(heading) > left {
            break;
        }
        left -= cost(heading);
        out.push(heading);
    }
    out.reverse();
    out.extend(&lines[start..]);
    out.join("\n")
}

fn join_blocks(blocks: &[&str]) -> String {
    blocks
        .iter()
        .filter(|b| !b.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn with_marker(body: String) -> String {
    if body.is_empty() {
        TRUNCATION_MARKER.to_string()
    } else {
        format!("{body}\n{TRUNCATION_MARKER}")
    }
}

/// Shrink `text` to at most `budget` characters without splitting a line.
///
/// Text that already fits is returned trimmed. Otherwise the result is a
/// recent excerpt (about 65% of the budget, with its heading trail)
/// followed by the structural sections gathered from the whole input.
pub fn truncate_structural(text: &str, budget: usize) -> String {
    let normalized = normalize(text);
    let trimmed = normalized.trim();
    if char_len(trimmed) <= budget {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    let excerpt = excerpt_with_trail(&lines, budget * EXCERPT_SHARE_PERCENT / 100);
    let structure = StructuralParts::collect(&lines).render();
    let assembled = join_blocks(&[&excerpt, &structure]);
    if char_len(&assembled) <= budget {
        return assembled;
    }

    let marker_cost = char_len(TRUNCATION_MARKER) + 1;
    let structure_len = char_len(&structure);
    if budget >= structure_len + marker_cost + 2 {
        // Structural sections fit; give the excerpt whatever room is left.
        let room = budget - structure_len - marker_cost - 2;
        let excerpt = excerpt_with_trail(&lines, room);
        return with_marker(join_blocks(&[&excerpt, &structure]));
    }

    if budget < marker_cost {
        return trim_to_chars(&assembled, budget);
    }
    with_marker(trim_to_chars(&assembled, budget - marker_cost))
}
