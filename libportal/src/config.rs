//! Configuration management for the cinema portal

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub portal: PortalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `https://cinema.example.com/api`
    pub base_url: String,

    /// Request timeout; the transport default applies when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the persisted session keys
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Roles allowed to sign in to this portal
    #[serde(default = "default_allowed_roles")]
    pub allowed_roles: Vec<Role>,
}

fn default_allowed_roles() -> Vec<Role> {
    vec![Role::Staff, Role::Admin]
}

fn default_storage_path() -> String {
    "~/.local/share/cinema-portal/session.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            allowed_roles: default_allowed_roles(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Falls back to [`Config::default_config`] when no file exists there.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default_config()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                timeout_secs: None,
            },
            storage: StorageConfig::default(),
            portal: PortalConfig::default(),
        }
    }

    /// `PORTAL_API_URL` replaces the configured backend URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("PORTAL_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }
        if self.portal.allowed_roles.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "portal.allowed_roles".to_string(),
                reason: "at least one role must be allowed".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Storage path with `~` expanded
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PORTAL_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("cinema-portal").join("config.toml"))
}
