// User settings for the ethos CLI
//
// Stored at <config_dir>/ethos/settings.toml. Every field is optional and
// command-line flags always win.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ethos_impact::credit::DEFAULT_SCOPE;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scope used by `credit apply` / `credit history` when --scope is absent.
    pub scope: Option<String>,
    /// Credit ledger location; defaults to <data_dir>/ethos/credits.jsonl.
    pub ledger: Option<PathBuf>,
}

impl Settings {
    /// Settings file path. `ETHOS_SETTINGS` points somewhere else.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os("ETHOS_SETTINGS") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ethos")
            .join("settings.toml")
    }

    /// Load settings from disk, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {e}; using default settings", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or(DEFAULT_SCOPE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.ledger.clone().unwrap_or_else(default_ledger_path)
    }
}

fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ethos")
        .join("credits.jsonl")
}
