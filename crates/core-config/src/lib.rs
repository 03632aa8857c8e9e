//! Shell configuration: `rush.toml` discovery and parsing.
//!
//! Lookup order: an explicit `--config` path, then `rush.toml` in the
//! working directory, then the platform config dir
//! (`~/.config/rush/rush.toml` on Linux). A missing or unparsable file
//! falls back to defaults with a warning in the log; a bad config must
//! never keep the shell from starting.
//!
//! `ENV=CODECRAFTERS` disables the optional interactive niceties (inline
//! hints and the completion candidate display) regardless of file content.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

use core_platform::EnvLookup;

/// Value of `ENV` that switches the optional features off.
pub const FEATURE_KILL_SWITCH: &str = "CODECRAFTERS";

const CONFIG_FILE: &str = "rush.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Prompt painted before every line.
    pub prompt: String,
    /// History file override; the `HISTFILE` environment variable applies
    /// when unset.
    pub histfile: Option<PathBuf>,
    /// Dimmed inline completion hints while typing.
    pub hints: bool,
    /// Tab completion (single-match replace, prefix extension, candidate
    /// list).
    pub completion: bool,
    /// Exit the shell on Ctrl-C instead of aborting the current line.
    pub ctrl_c_exits: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            histfile: None,
            hints: true,
            completion: true,
            ctrl_c_exits: false,
        }
    }
}

impl Config {
    /// History file path: config first, `HISTFILE` second.
    pub fn history_path(&self, env: &dyn EnvLookup) -> Option<PathBuf> {
        if let Some(path) = &self.histfile {
            return Some(path.clone());
        }
        let from_env = env.get("HISTFILE");
        if from_env.is_empty() {
            None
        } else {
            Some(PathBuf::from(from_env))
        }
    }
}

/// Best-effort config path following platform conventions: working
/// directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("rush").join(CONFIG_FILE);
    }
    local
}

/// Load from `path` (or the discovered location), defaulting on absence or
/// parse failure, then apply the environment kill switch.
pub fn load(path: Option<PathBuf>, env: &dyn EnvLookup) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut config = load_from(&path);
    if env.get("ENV") == FEATURE_KILL_SWITCH {
        info!(target: "config", "optional features disabled by ENV");
        config.hints = false;
        config.completion = false;
    }
    Ok(config)
}

fn load_from(path: &Path) -> Config {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            info!(target: "config", path = %path.display(), "loaded");
            config
        }
        Err(err) => {
            warn!(target: "config", path = %path.display(), error = %err, "falling back to defaults");
            Config::default()
        }
    }
}
