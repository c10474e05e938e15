//! JSON persistence for the per-day snapshot cache.
//!
//! Reads never fail: a missing or corrupt file is an empty mapping. Writes
//! replace the whole file through a temporary sibling and a rename.
//!
//! There is no locking. Two invocations racing on the same day both read
//! the old mapping and the last writer wins; acceptable while one
//! interactive session runs at a time.

use std::fs;
use std::path::{Path, PathBuf};

use lm_core::CacheState;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> CacheState {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheState::new(),
            Err(e) => {
                tracing::warn!("unreadable cache {}: {e}; starting empty", self.path.display());
                return CacheState::new();
            }
        };

        let parsed = CacheState::parse_lenient(&content);
        if let Some(reason) = &parsed.corrupt {
            tracing::warn!("corrupt cache {}: {reason}; starting empty", self.path.display());
        }
        if !parsed.dropped.is_empty() {
            tracing::warn!(
                "dropped {} malformed cache entries: {}",
                parsed.dropped.len(),
                parsed.dropped.join(", ")
            );
        }
        parsed.state
    }

    pub fn save(&self, state: &CacheState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = state.to_json_pretty()?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json + "\n")?;
        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!("saved {} cache entries to {}", state.len(), self.path.display());
        Ok(())
    }
}
