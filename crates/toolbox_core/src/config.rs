//! Engine configuration.
//!
//! Loads settings from `$XDG_CONFIG_HOME/linux-toolbox/engine.toml` or uses
//! defaults. Every field has a default so partial files are fine.

use crate::dispatch::terminal::TerminalEmulator;
use crate::host::OS_RELEASE_PATHS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Config directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "linux-toolbox";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "engine.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Host identification files, first readable wins
    #[serde(default = "default_os_release_paths")]
    pub os_release_paths: Vec<PathBuf>,

    /// Timeout for captured background runs
    #[serde(default = "default_background_timeout")]
    pub background_timeout_secs: u64,

    /// Max characters of captured output carried in a message
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,

    /// Program prepended to commands that need superuser rights
    #[serde(default = "default_elevation_prefix")]
    pub elevation_prefix: String,

    /// Terminal emulators in order of preference
    #[serde(default = "default_terminals")]
    pub terminals: Vec<String>,

    /// Never open a terminal; always capture
    #[serde(default)]
    pub force_background: bool,

    /// Restrict parameter values to package-name characters
    #[serde(default = "default_validate_parameters")]
    pub validate_parameters: bool,
}

fn default_os_release_paths() -> Vec<PathBuf> {
    OS_RELEASE_PATHS.iter().map(PathBuf::from).collect()
}

fn default_background_timeout() -> u64 {
    60
}

fn default_message_limit() -> usize {
    500
}

fn default_elevation_prefix() -> String {
    "sudo".to_string()
}

fn default_terminals() -> Vec<String> {
    TerminalEmulator::PREFERENCE
        .iter()
        .map(|t| t.binary().to_string())
        .collect()
}

fn default_validate_parameters() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            os_release_paths: default_os_release_paths(),
            background_timeout_secs: default_background_timeout(),
            message_limit: default_message_limit(),
            elevation_prefix: default_elevation_prefix(),
            terminals: default_terminals(),
            force_background: false,
            validate_parameters: default_validate_parameters(),
        }
    }
}

impl EngineConfig {
    /// Default config file location, if a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_or_default(&path),
            _ => Self::default(),
        }
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from_path(path).unwrap_or_else(|e| {
            warn!("Config unusable, using defaults: {:#}", e);
            Self::default()
        })
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: EngineConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the default config to `path`
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Self::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }

    pub fn background_timeout(&self) -> Duration {
        Duration::from_secs(self.background_timeout_secs)
    }

    /// Configured terminals that the toolbox knows how to launch
    pub fn terminal_preference(&self) -> Vec<TerminalEmulator> {
        self.terminals
            .iter()
            .filter_map(|name| {
                let terminal = TerminalEmulator::from_binary(name);
                if terminal.is_none() {
                    warn!("Ignoring unknown terminal emulator '{}'", name);
                }
                terminal
            })
            .collect()
    }
}
