//! Appending events to today's daily note.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::error::{Result, SourceError, StoreError};
use crate::source::CommandSource;
use crate::vault::Vault;

/// One event line destined for the daily log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// `HH:MM`
    pub time: String,
    pub category: String,
    pub event: String,
    pub details: String,
    /// Comma-separated tag list as typed by the user.
    pub tags: String,
}

impl EventRecord {
    /// `- **HH:MM** [category] event: details #tag1 #tag2`
    pub fn to_line(&self) -> String {
        let tags = self
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("#{}", t.trim_start_matches('#')))
            .collect::<Vec<_>>()
            .join(" ");
        let details = self.details.trim();
        let details = if details.is_empty() {
            String::new()
        } else {
            format!(": {details}")
        };
        format!(
            "- **{}** [{}] {}{} {}",
            self.time,
            self.category.trim(),
            self.event.trim(),
            details,
            tags
        )
        .trim_end()
        .to_string()
    }
}

/// Where an event ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendTarget {
    Command,
    File(PathBuf),
}

/// Append `line` to the day's note, preferring the note application and
/// falling back to the first existing daily file (or a new `Daily/<date>.md`).
///
/// Only an unavailable application triggers the fallback. A timed-out append
/// is reported as an error since its outcome is unknown.
pub fn append_event(
    vault: &Vault,
    command: Option<&CommandSource>,
    date: &str,
    line: &str,
) -> Result<AppendTarget> {
    if let Some(command) = command {
        let content = format!("content=\n{line}");
        match command.run(&["daily:append", &content, "silent"]) {
            Ok(_) => return Ok(AppendTarget::Command),
            // The application may still finish the append; writing the file
            // as well could record the event twice.
            Err(e @ SourceError::Timeout(_)) => return Err(StoreError::Source(e)),
            Err(e) => tracing::warn!("daily:append failed ({e}); appending to file"),
        }
    }

    let path = vault
        .daily_candidates(date)
        .into_iter()
        .find(|p| p.is_file())
        .unwrap_or_else(|| vault.default_daily_path(date));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let needs_newline = fs::read_to_string(&path)
        .map(|existing| !existing.is_empty() && !existing.ends_with('\n'))
        .unwrap_or(false);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_newline {
        writeln!(file)?;
    }
    writeln!(file, "{line}")?;
    Ok(AppendTarget::File(path))
}
