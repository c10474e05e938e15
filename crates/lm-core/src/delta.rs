use crate::cache::CacheEntry;
use crate::text::trim_blank_lines;

/// Lines appended since the prior checkpoint, trimmed of surrounding blank
/// lines. Empty when there is no prior entry for today or the note did not
/// grow past the checkpoint.
pub fn extract_delta(prior: Option<&CacheEntry>, normalized_note: &str) -> String {
    let Some(prior) = prior else {
        return String::new();
    };
    let lines: Vec<&str> = normalized_note.lines().collect();
    if lines.len() <= prior.last_line_count {
        return String::new();
    }
    trim_blank_lines(&lines[prior.last_line_count..])
}
