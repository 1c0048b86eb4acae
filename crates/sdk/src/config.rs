use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::portal::options::default_portal_url;
use crate::portal::CommonOptions;

pub const APP_NAME: &str = "skynet";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Persistent client configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkynetConfig {
    /// Portal used when a call does not name one
    #[serde(default = "default_portal_url")]
    pub portal_url: Url,
    /// Cookie sent with every request (e.g. a portal login JWT)
    #[serde(default)]
    pub custom_cookie: Option<String>,
    /// API key sent with every request
    #[serde(default)]
    pub skynet_api_key: Option<String>,
    /// Connection timeout in seconds (no limit if not set)
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for SkynetConfig {
    fn default() -> Self {
        Self {
            portal_url: default_portal_url(),
            custom_cookie: None,
            skynet_api_key: None,
            connect_timeout_secs: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDirectory,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SkynetConfig {
    /// Path of the default config file (`~/.skynet/config.toml`)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one the default file is read if
    /// present, otherwise the defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    tracing::debug!("no config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_toml = fs::read_to_string(path)?;
        Self::from_toml_str(&config_toml)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// The request options this configuration implies
    pub fn common_options(&self) -> CommonOptions {
        CommonOptions {
            portal_url: self.portal_url.clone(),
            custom_cookie: self.custom_cookie.clone(),
            skynet_api_key: self.skynet_api_key.clone(),
        }
    }
}
