//! One session-bootstrap invocation: acquire, gate, rebuild, persist.
//!
//! This is the error boundary. Whatever happens inside, the caller gets a
//! [`ContextArtifact`]: a snapshot, the empty-state message, or an error
//! artifact describing what went wrong.

use std::panic::{self, AssertUnwindSafe};

use lm_core::{
    Budget, ConstraintRules, ContextArtifact, GOVERNANCE_FILES, LogDocument, SnapshotRequest,
    SnapshotStatus, is_calendar_day, refresh,
};

use crate::cache_file::CacheFile;
use crate::clock;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::source::{CommandSource, ContentSource, FileSource, acquire_daily, load_governance};
use crate::vault::Vault;

#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Day to snapshot; defaults to today.
    pub date: Option<String>,
    /// Overrides the configured token budget.
    pub max_tokens: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub date: String,
    pub artifact: ContextArtifact,
    /// `None` when the pipeline failed before a snapshot was produced.
    pub status: Option<SnapshotStatus>,
    /// Set when the snapshot was produced but could not be cached.
    pub cache_error: Option<String>,
}

pub struct Bootstrapper {
    vault: Vault,
    budget: Budget,
    rules: ConstraintRules,
    sources: Vec<Box<dyn ContentSource>>,
    today: String,
}

impl Bootstrapper {
    /// Standard source chain: the note application's command, then files.
    pub fn new(vault: Vault, config: &Config, obsidian_env: Option<String>) -> Self {
        Self::for_day(vault, config, obsidian_env, clock::today())
    }

    /// Standard source chain with `today` fixed by the caller, so the
    /// command source and the default date always agree.
    pub fn for_day(
        vault: Vault,
        config: &Config,
        obsidian_env: Option<String>,
        today: impl Into<String>,
    ) -> Self {
        let today = today.into();
        let command = CommandSource::new(
            config.obsidian_bin(obsidian_env),
            &vault,
            config.command_timeout(),
            today.clone(),
        );
        let file = FileSource::new(&vault);
        let sources: Vec<Box<dyn ContentSource>> = vec![Box::new(command), Box::new(file)];
        Self::with_sources(vault, config, sources, today)
    }

    pub fn with_sources(
        vault: Vault,
        config: &Config,
        sources: Vec<Box<dyn ContentSource>>,
        today: impl Into<String>,
    ) -> Self {
        Self {
            vault,
            budget: Budget::new(config.token_budget()),
            rules: config.constraint_rules(),
            sources,
            today: today.into(),
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Run the pipeline. Never fails and never panics.
    pub fn run(&self, options: &BootstrapOptions) -> BootstrapReport {
        let date = options.date.clone().unwrap_or_else(|| self.today.clone());
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.try_run(&date, options)));
        let reason = match attempt {
            Ok(Ok(report)) => return report,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("internal error: {msg}")
            }
        };
        tracing::error!("bootstrap failed for {date}: {reason}");
        BootstrapReport {
            date,
            artifact: ContextArtifact::error(&reason),
            status: None,
            cache_error: None,
        }
    }

    fn try_run(&self, date: &str, options: &BootstrapOptions) -> Result<BootstrapReport> {
        if !is_calendar_day(date) {
            return Err(StoreError::InvalidData(format!(
                "date must be YYYY-MM-DD, got {date:?}"
            )));
        }
        if !self.vault.exists() {
            return Err(StoreError::InvalidData(format!(
                "vault path does not exist: {}",
                self.vault.root().display()
            )));
        }

        let log = LogDocument::new(date, acquire_daily(&self.sources, date));
        let names: Vec<&str> = GOVERNANCE_FILES.iter().map(|(name, _)| *name).collect();
        let governance = load_governance(&self.vault, &names);

        let cache = CacheFile::new(self.vault.cache_path());
        let state = cache.load();
        let now = clock::now_iso8601();
        let budget = options.max_tokens.map(Budget::new).unwrap_or(self.budget);
        let request = SnapshotRequest {
            log: &log,
            governance: &governance,
            rules: &self.rules,
            budget,
            now_iso: &now,
        };
        let (state, outcome) = refresh(state, &request);
        tracing::info!(
            "snapshot for {date}: {} ({} lines, {} chars)",
            outcome.status.as_str(),
            outcome.entry.last_line_count,
            outcome.snapshot().chars().count()
        );

        let mut cache_error = None;
        if outcome.status != SnapshotStatus::Cached
            && let Err(e) = cache.save(&state)
        {
            tracing::error!("failed to persist cache {}: {e}", cache.path().display());
            cache_error = Some(e.to_string());
        }

        Ok(BootstrapReport {
            date: date.to_string(),
            artifact: ContextArtifact::from_snapshot(
                date,
                outcome.snapshot(),
                &outcome.entry.last_updated_iso,
            ),
            status: Some(outcome.status),
            cache_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::SourceResult;
    use lm_core::ArtifactKind;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const DATE: &str = "2026-03-01";

    struct Counting {
        calls: Arc<AtomicUsize>,
        text: String,
    }

    impl ContentSource for Counting {
        fn describe(&self) -> String {
            "counting".into()
        }

        fn fetch_daily(&self, _date: &str) -> SourceResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.text.is_empty() {
                Err(SourceError::Timeout(std::time::Duration::from_millis(1)))
            } else {
                Ok(self.text.clone())
            }
        }
    }

    struct Exploding;

    impl ContentSource for Exploding {
        fn describe(&self) -> String {
            "exploding".into()
        }

        fn fetch_daily(&self, _date: &str) -> SourceResult<String> {
            panic!("source blew up");
        }
    }

    fn bootstrapper(dir: &TempDir, text: &str) -> Bootstrapper {
        let source = Counting {
            calls: Arc::new(AtomicUsize::new(0)),
            text: text.to_string(),
        };
        Bootstrapper::with_sources(
            Vault::new(dir.path()),
            &Config::default(),
            vec![Box::new(source), Box::new(FileSource::new(&Vault::new(dir.path())))],
            DATE,
        )
    }

    fn options() -> BootstrapOptions {
        BootstrapOptions {
            date: Some(DATE.to_string()),
            max_tokens: None,
        }
    }

    #[test]
    fn test_timeout_without_fallback_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let report = bootstrapper(&dir, "").run(&options());
        assert_eq!(report.artifact, ContextArtifact::empty(DATE));
        assert_eq!(report.status, Some(SnapshotStatus::Built));
    }

    #[test]
    fn test_second_run_is_cached_and_identical() {
        let dir = TempDir::new().unwrap();
        let b = bootstrapper(&dir, "- **08:00** [life] coffee");
        let first = b.run(&options());
        let second = b.run(&options());
        assert_eq!(first.artifact.kind, ArtifactKind::Snapshot);
        assert_eq!(second.status, Some(SnapshotStatus::Cached));
        assert_eq!(first.artifact, second.artifact);
    }

    #[test]
    fn test_corrupt_cache_is_rebuilt_and_repaired() {
        let dir = TempDir::new().unwrap();
        let cache_path = Vault::new(dir.path()).cache_path();
        fs::create_dir_all(cache_path.parent().unwrap()).unwrap();
        fs::write(&cache_path, "this is not json").unwrap();

        let report = bootstrapper(&dir, "- note").run(&options());
        assert_eq!(report.status, Some(SnapshotStatus::Built));
        assert!(report.cache_error.is_none());
        let written = fs::read_to_string(&cache_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value[DATE]["lastLineCount"], 1);
    }

    #[test]
    fn test_cache_write_failure_still_returns_snapshot() {
        let dir = TempDir::new().unwrap();
        // A file where the state directory should be makes the write fail.
        fs::write(dir.path().join(crate::vault::STATE_DIR_NAME), "blocker").unwrap();

        let report = bootstrapper(&dir, "- note").run(&options());
        assert_eq!(report.artifact.kind, ArtifactKind::Snapshot);
        assert!(report.cache_error.is_some());
    }

    #[test]
    fn test_missing_vault_is_error_artifact() {
        let dir = TempDir::new().unwrap();
        let b = Bootstrapper::with_sources(
            Vault::new(dir.path().join("missing")),
            &Config::default(),
            Vec::new(),
            DATE,
        );
        let report = b.run(&options());
        assert_eq!(report.artifact.kind, ArtifactKind::Error);
        assert!(report.artifact.content.contains("vault path does not exist"));
        assert!(report.status.is_none());
    }

    #[test]
    fn test_bad_date_is_error_artifact() {
        let dir = TempDir::new().unwrap();
        let report = bootstrapper(&dir, "x").run(&BootstrapOptions {
            date: Some("../../etc".into()),
            max_tokens: None,
        });
        assert_eq!(report.artifact.kind, ArtifactKind::Error);
    }

    #[test]
    fn test_panic_is_contained() {
        let dir = TempDir::new().unwrap();
        let b = Bootstrapper::with_sources(
            Vault::new(dir.path()),
            &Config::default(),
            vec![Box::new(Exploding)],
            DATE,
        );
        let report = b.run(&options());
        assert_eq!(report.artifact.kind, ArtifactKind::Error);
        assert!(report.artifact.content.contains("source blew up"));
    }

    #[test]
    fn test_governance_files_feed_snapshot() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SOUL.md"), "# Soul\n- NEVER delete user files\n").unwrap();
        let report = bootstrapper(&dir, "").run(&options());
        assert_eq!(report.artifact.kind, ArtifactKind::Snapshot);
        assert!(report.artifact.content.contains("- NEVER delete user files"));
    }

    #[test]
    fn test_daily_file_fallback_used() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Daily")).unwrap();
        fs::write(dir.path().join("Daily/2026-03-01.md"), "- from the file\n").unwrap();
        let report = bootstrapper(&dir, "").run(&options());
        assert!(report.artifact.content.contains("- from the file"));
    }

    #[test]
    fn test_default_date_is_the_fixed_day() {
        let dir = TempDir::new().unwrap();
        let report = bootstrapper(&dir, "- x").run(&BootstrapOptions::default());
        assert_eq!(report.date, DATE);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_source_shares_the_bootstrap_day() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("fake-obsidian");
        fs::write(&bin, "#!/bin/sh\necho '- from the application'\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let b = Bootstrapper::for_day(
            Vault::new(dir.path()),
            &Config::default(),
            Some(bin.to_string_lossy().into_owned()),
            DATE,
        );
        let report = b.run(&BootstrapOptions::default());
        assert_eq!(report.date, DATE);
        assert!(report.artifact.content.contains("- from the application"));
    }
}
