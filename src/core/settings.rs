//! User settings kept outside the cost store.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rates_url: Option<String>,
}

/// Where a rate provider reads the exchange rate source URL from.
pub trait SettingsSource: Send + Sync {
    fn exchange_rates_url(&self) -> Option<String>;
}

impl SettingsSource for Settings {
    fn exchange_rates_url(&self) -> Option<String> {
        self.exchange_rates_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }
}

/// Settings persisted as a YAML file. Every read goes back to disk.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as empty settings.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings file at {}", self.path.display());
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", self.path.display()))
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(settings)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    pub fn set_exchange_rates_url(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            bail!("Exchange rate source URL must not be empty");
        }
        let mut settings = self.load()?;
        settings.exchange_rates_url = Some(url.to_string());
        self.save(&settings)
    }

    pub fn clear_exchange_rates_url(&self) -> Result<()> {
        let mut settings = self.load()?;
        settings.exchange_rates_url = None;
        self.save(&settings)
    }
}

impl SettingsSource for SettingsFile {
    fn exchange_rates_url(&self) -> Option<String> {
        match self.load() {
            Ok(settings) => settings.exchange_rates_url(),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "Ignoring unreadable settings, using default rates: {e:#}"
                );
                None
            }
        }
    }
}
