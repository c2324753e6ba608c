//! Configuration file loader.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extract::RuleSet;
use crate::sink::SuccessPolicy;

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Locations of the template source and the target list.
    pub paths: PathsConfig,
    /// Per-file polling behaviour.
    pub watcher: WatcherConfig,
    /// Outbound webhook behaviour.
    pub delivery: DeliveryConfig,
    /// Optional extraction rules.
    pub rules: RulesConfig,
    /// Long-running service behaviour.
    pub service: ServiceConfig,
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// INI (or TOML) file holding the `[MESSAGES]` templates.
    pub templates: PathBuf,
    /// JSON array of `{ logfile, webhook }` records.
    pub targets: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: PathBuf::from("config/config.ini"),
            targets: PathBuf::from("data/settings.json"),
        }
    }
}

/// Watcher polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Idle wait between polls when no new line is available.
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl WatcherConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Webhook delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Which HTTP statuses count as delivered.
    pub success: SuccessPolicy,
    /// Overall request timeout.
    pub timeout_secs: u64,
    /// Connection establishment timeout.
    pub connect_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            success: SuccessPolicy::Strict,
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

impl DeliveryConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Toggles for the optional extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Enable the `connecting to server [...]` rule.
    pub server_connect: bool,
    /// Enable verbatim forwarding of `[Lobby] ...` lines.
    pub lobby_passthrough: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            server_connect: true,
            lobby_passthrough: true,
        }
    }
}

impl RulesConfig {
    /// Build the rule set these toggles describe.
    #[must_use]
    pub fn rule_set(&self) -> RuleSet {
        RuleSet {
            server_connect: self.server_connect,
            lobby_passthrough: self.lobby_passthrough,
        }
    }
}

/// Service-mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Restart watchers when the target list changes on disk.
    pub reload_targets: bool,
    /// How often the target list timestamp is checked.
    pub targets_check_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            reload_targets: false,
            targets_check_secs: 30,
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.targets_check_secs.max(1))
    }
}

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("ghost-monitor.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("ghost-monitor").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(&path)
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
