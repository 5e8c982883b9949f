use crate::core::cost::Currency;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_database_name() -> String {
    "costsdb".to_string()
}

fn default_schema_version() -> u64 {
    1
}

fn default_currency() -> Currency {
    Currency::Usd
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_name")]
    pub name: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            name: default_database_name(),
            schema_version: default_schema_version(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Currency reports are shown in unless another one is asked for.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    pub data_path: Option<String>,
    pub settings_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database: DatabaseConfig::default(),
            currency: default_currency(),
            data_path: None,
            settings_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config at the default location. A missing file gives the defaults.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("io", "costbook", "costbook")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.settings_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.config_dir().join("settings.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
