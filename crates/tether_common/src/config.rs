//! Configuration for tether.
//!
//! Loads settings from a TOML file or uses defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::actor::{ActorKind, SelectionPolicy};
use crate::error::{Result, TetherError};

/// Default config file path
pub const CONFIG_PATH: &str = "tether.toml";

/// Dispatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Actor used when the command line does not pick one
    #[serde(default)]
    pub actor: ActorKind,

    /// Selection policy of the simulated actor
    #[serde(default)]
    pub policy: SelectionPolicy,

    /// Interactive actor waits for a confirmation after each action
    #[serde(default)]
    pub ask_completion: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Where plan and scenario files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_plan_dir")]
    pub plan_dir: String,

    #[serde(default = "default_scenario_dir")]
    pub scenario_dir: String,
}

fn default_plan_dir() -> String {
    "plans".to_string()
}

fn default_scenario_dir() -> String {
    "scenarios".to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            plan_dir: default_plan_dir(),
            scenario_dir: default_scenario_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub library: LibraryConfig,
}

impl TetherConfig {
    /// Load config from `path`, falling back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::load_from_path(path.as_ref()).unwrap_or_else(|e| {
            warn!("Config not loaded, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: TetherConfig = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| TetherError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TetherConfig = toml::from_str("[dispatch]\nactor = \"simulated\"\n").unwrap();
        assert_eq!(config.dispatch.actor, ActorKind::Simulated);
        assert_eq!(config.dispatch.policy, SelectionPolicy::FirstEnabled);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.library.plan_dir, "plans");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = TetherConfig::load("/nonexistent/tether.toml");
        assert_eq!(config.dispatch.actor, ActorKind::Scripted);
        assert!(!config.dispatch.ask_completion);
    }

    #[test]
    fn test_save_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("tether.toml");
        TetherConfig::save_default(&path).unwrap();

        let loaded = TetherConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.library.scenario_dir, "scenarios");
        assert_eq!(loaded.dispatch.policy, SelectionPolicy::FirstEnabled);
    }
}
