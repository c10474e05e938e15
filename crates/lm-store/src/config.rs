//! Persisted user configuration (`config.toml` in the state directory).

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use lm_core::{ConstraintRules, DEFAULT_TOKEN_BUDGET};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_OBSIDIAN_BIN: &str = "obsidian";
const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 3000;

pub(crate) fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Directory holding `config.toml`.
/// Priority: `LM_STATE_DIR` > `$XDG_STATE_HOME/life-memory` > `~/.local/state/life-memory`
pub fn default_state_dir() -> PathBuf {
    if let Ok(dir) = env::var("LM_STATE_DIR")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    env::var("XDG_STATE_HOME")
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| dirs_home().join(".local").join("state"))
        .join("life-memory")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsidian_bin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_ms: Option<u64>,
    /// Replaces the default heading keywords when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_keywords: Option<Vec<String>>,
    /// Replaces the default bullet keywords when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_keywords: Option<Vec<String>>,
}

impl Config {
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(CONFIG_FILE)
    }

    /// Load from `state_dir`; a missing file yields defaults.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = Self::path(state_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        let content = toml::to_string_pretty(self)?;
        fs::write(Self::path(state_dir), content)?;
        Ok(())
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget.unwrap_or(DEFAULT_TOKEN_BUDGET)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms.unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS))
    }

    /// Note-application binary: `env_override` (from `OBSIDIAN_BIN`) wins
    /// over the config value, which wins over the default.
    pub fn obsidian_bin(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|b| !b.is_empty())
            .or_else(|| self.obsidian_bin.clone())
            .unwrap_or_else(|| DEFAULT_OBSIDIAN_BIN.to_string())
    }

    pub fn constraint_rules(&self) -> ConstraintRules {
        let mut rules = ConstraintRules::default();
        if let Some(keywords) = &self.section_keywords {
            rules.section_keywords = keywords.clone();
        }
        if let Some(keywords) = &self.bullet_keywords {
            rules.bullet_keywords = keywords.clone();
        }
        rules
    }
}
