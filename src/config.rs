//! Configuration management for rocket-launches.
//!
//! Configuration is loaded with figment from defaults, an optional TOML file
//! and `ROCKET_LAUNCHES_`-prefixed environment variables.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";

const APP_NAME: &str = "rocket-launches";

const DATABASE_FILE_NAME: &str = "launches.db";

/// Application configuration.
///
/// Sources, highest precedence first:
/// 1. Environment variables (`ROCKET_LAUNCHES_API__BASE_URL`, ...)
/// 2. TOML config file at `<config dir>/rocket-launches/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

/// Remote launch API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; feed paths such as `launches/upcoming` are appended.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Local storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `<data dir>/launches.db`
    pub database_path: Option<PathBuf>,
    /// Defaults to the platform cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spacexdata.com/v5".to_string(),
            timeout_secs: 30,
            user_agent: APP_NAME.to_string(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(config_file) = config_path.or_else(Self::default_config_path) {
            figment = figment.merge(Toml::file(config_file));
        }

        let config: Config = figment
            .merge(Env::prefixed("ROCKET_LAUNCHES_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".").join(APP_NAME))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let url = &self.api.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("api.base_url must be an http(s) URL, got '{url}'"),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "api.timeout_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
