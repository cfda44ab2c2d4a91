pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "HWCLOUD_CONFIG_PATH";
pub const REGION_ENV: &str = "HW_REGION_NAME";
pub const PROJECT_ID_ENV: &str = "HW_PROJECT_ID";
pub const AUTH_TOKEN_ENV: &str = "HW_AUTH_TOKEN";

const CONFIG_CANDIDATES: [&str; 2] = ["hwcloud.json", ".hwcloud.json"];

/// Directory holding the global configuration (`~/.config/hwcloud`)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hwcloud"))
}

/// Locate the configuration file.
///
/// Search order:
/// 1. `HWCLOUD_CONFIG_PATH` (must exist when set)
/// 2. current directory: `hwcloud.json`, `.hwcloud.json`
/// 3. `~/.config/hwcloud/config.json`
///
/// Returns `None` when no file exists; environment variables alone are a
/// valid configuration.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound(path));
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CONFIG_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Some(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.json");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Operation timeouts in seconds, per lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub create_secs: u64,
    pub update_secs: u64,
    pub delete_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_secs: 60 * 60,
            update_secs: 3 * 60 * 60,
            delete_secs: 40 * 60,
        }
    }
}

impl TimeoutConfig {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

/// On-disk configuration; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub region: Option<String>,
    pub project_id: Option<String>,
    pub auth_token: Option<String>,
    /// Per-service endpoint overrides, e.g. `"mrs": "https://mrs.example.com/"`
    pub endpoints: HashMap<String, String>,
    pub timeouts: TimeoutConfig,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Validated provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub region: String,
    pub project_id: String,
    pub auth_token: String,
    pub endpoints: HashMap<String, String>,
    pub timeouts: TimeoutConfig,
}

impl ProviderConfig {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let file = match find_config_file()? {
            Some(path) => {
                tracing::debug!("Loading provider config from {}", path.display());
                ConfigFile::load(&path)?
            }
            None => ConfigFile::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge `file` with values from `env`; environment values win
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pick = |value: Option<String>, field: &'static str, key: &'static str| {
            env(key)
                .or(value)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing { field, env: key })
        };

        let region = pick(file.region, "region", REGION_ENV)?;
        let project_id = pick(file.project_id, "project_id", PROJECT_ID_ENV)?;
        let auth_token = pick(file.auth_token, "auth_token", AUTH_TOKEN_ENV)?;

        for (service, endpoint) in &file.endpoints {
            if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                return Err(ConfigError::Invalid {
                    field: "endpoints",
                    message: format!("endpoint for '{}' is not an URL: {}", service, endpoint),
                });
            }
        }

        Ok(Self {
            region,
            project_id,
            auth_token,
            endpoints: file.endpoints,
            timeouts: file.timeouts,
        })
    }

    /// Endpoint override for `service`, if configured
    pub fn endpoint_override(&self, service: &str) -> Option<&str> {
        self.endpoints.get(service).map(String::as_str)
    }
}
