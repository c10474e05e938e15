//! Line-oriented text helpers shared by every stage of the pipeline.
//!
//! All lengths are measured in Unicode scalar values, never bytes, so a
//! budget means the same thing for ASCII notes and emoji-heavy ones.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::CHARS_PER_TOKEN;

static CALENDAR_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap());

/// True for `YYYY-MM-DD` strings with a plausible month and day.
pub fn is_calendar_day(s: &str) -> bool {
    CALENDAR_DAY.is_match(s)
}

/// Unify line endings: `\r\n` and lone `\r` become `\n`.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Number of lines in already-normalized text. A trailing newline does not
/// count as an extra line.
pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Token estimate used throughout: characters ÷ 4, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    char_len(text).div_ceil(CHARS_PER_TOKEN)
}

/// Characters available for a given number of tokens.
pub fn tokens_to_chars(tokens: usize) -> usize {
    tokens.saturating_mul(CHARS_PER_TOKEN)
}

/// Keep the longest prefix of whole lines whose joined length fits in
/// `limit` characters. Lines are never split; everything from the first
/// line that does not fit onward is dropped.
pub fn trim_to_chars(text: &str, limit: usize) -> String {
    if char_len(text) <= limit {
        return text.to_string();
    }
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0usize;
    for line in text.lines() {
        let cost = char_len(line) + usize::from(!kept.is_empty());
        if used + cost > limit {
            break;
        }
        used += cost;
        kept.push(line);
    }
    kept.join("\n")
}

/// Drop leading and trailing blank (whitespace-only) lines, keeping inner
/// lines verbatim.
pub fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

/// Markdown ATX heading level (1-6) of a line, if it is a heading.
pub fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
        Some(hashes)
    } else {
        None
    }
}

/// Title text of a heading line (without the leading hashes).
pub fn heading_title(line: &str) -> &str {
    line.trim_start().trim_start_matches('#').trim()
}
