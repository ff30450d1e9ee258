//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use camplanka_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const APP_DIR: &str = "camplanka";
const STORE_FILE_NAME: &str = "store.json";

pub const USER_ENV: &str = "CAMPLANKA_USER";
pub const DATA_ENV: &str = "CAMPLANKA_DATA";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub data_path: Option<PathBuf>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn default_data_path() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join(STORE_FILE_NAME))
        .ok_or_else(|| "Failed to resolve data directory".to_string())
}

/// First non-empty value in precedence order.
pub fn first_present(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates.into_iter().find_map(normalize_text_option)
}

fn env_value(name: &str) -> Option<String> {
    normalize_text_option(std::env::var(name).ok())
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self {
                version: default_config_version(),
                ..Self::default()
            });
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// User id from the flag, then `CAMPLANKA_USER`, then the config file.
    pub fn resolve_user(&self, explicit: Option<&str>) -> Option<String> {
        first_present([
            explicit.map(str::to_string),
            env_value(USER_ENV),
            self.user_id.clone(),
        ])
    }

    /// Store file from the flag, then `CAMPLANKA_DATA`, then the config file,
    /// then the platform data directory.
    pub fn resolve_data_path(&self, explicit: Option<PathBuf>) -> Result<PathBuf, String> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        if let Some(path) = env_value(DATA_ENV) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = self.data_path.clone() {
            return Ok(path);
        }
        default_data_path()
    }

    fn normalize(&mut self) {
        self.user_id = normalize_text_option(self.user_id.take());
        self.display_name = normalize_text_option(self.display_name.take());
        self.data_path = self
            .data_path
            .take()
            .filter(|path| !path.as_os_str().is_empty());
    }
}
