use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::provider::{ProviderId, worldweatheronline::DEFAULT_BASE_URL};

/// Settings stored on disk.
///
/// Example TOML:
/// ```toml
/// provider = "worldweatheronline"
/// api_key = "..."
/// port = 8080
/// templates_dir = "templates"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider id, e.g. "worldweatheronline" or "mock".
    pub provider: Option<String>,

    pub api_key: Option<String>,

    pub base_url: String,

    pub templates_dir: PathBuf,

    pub static_dir: PathBuf,

    pub port: u16,

    /// Upstream request timeout. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("public/static"),
            port: 8080,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// The configured provider, World Weather Online when none is set.
    pub fn provider_id(&self) -> Result<ProviderId> {
        match self.provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::WorldWeatherOnline),
        }
    }

    pub fn set_provider(&mut self, id: ProviderId) {
        self.provider = Some(id.as_str().to_string());
    }

    /// Returns the API key, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-widget", "weather-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
