//! Vault root resolution and the conventional paths inside a vault.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::{Config, dirs_home};

/// Hidden directory (under the vault root) holding derived state.
pub const STATE_DIR_NAME: &str = ".life-memory";
const CACHE_FILE_NAME: &str = "snapshot-cache.json";

/// Subfolders searched, in order, for a day's note file.
const DAILY_SUBDIRS: &[&str] = &["Daily", "memory", ""];
/// Subfolders searched, in order, for a governance document.
const GOVERNANCE_SUBDIRS: &[&str] = &["", "Identity", "Context"];

/// Expand a leading `~` and make relative paths absolute against the CWD.
fn absolutize(path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => dirs_home().join(rest),
        Err(_) => path.to_path_buf(),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(expanded)
    }
}

/// Resolve the vault root.
///
/// Priority chain:
/// 1. Explicit override (`--vault` or `LM_VAULT`)
/// 2. `vault_path` from the persisted config
/// 3. Current working directory
pub fn resolve_vault_root(explicit: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return absolutize(path);
    }
    if let Some(path) = config.vault_path.as_deref() {
        return absolutize(path);
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(STATE_DIR_NAME).join(CACHE_FILE_NAME)
    }

    /// Candidate files for a day's note, most conventional first.
    pub fn daily_candidates(&self, date: &str) -> Vec<PathBuf> {
        let file = format!("{date}.md");
        DAILY_SUBDIRS
            .iter()
            .map(|sub| self.root.join(sub).join(&file))
            .collect()
    }

    /// Where a new daily note is created when none exists yet.
    pub fn default_daily_path(&self, date: &str) -> PathBuf {
        self.root.join(DAILY_SUBDIRS[0]).join(format!("{date}.md"))
    }

    pub fn governance_candidates(&self, name: &str) -> Vec<PathBuf> {
        GOVERNANCE_SUBDIRS
            .iter()
            .map(|sub| self.root.join(sub).join(name))
            .collect()
    }
}
