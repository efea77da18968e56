use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use alertsync_newrelic::{DEFAULT_API_URL, DEFAULT_INFRA_API_URL, Endpoints};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

pub const CONFIG_KEYS: &[&str] = &["api_url", "infra_api_url", "format"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl ProfileConfig {
    /// Sets one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => self.api_url = Some(value.to_string()),
            "infra_api_url" => self.infra_api_url = Some(value.to_string()),
            "format" => {
                let format = OutputFormat::from_str(value, true)
                    .map_err(|e| anyhow::anyhow!("Invalid format '{value}': {e}"))?;
                self.format = Some(format);
            }
            other => anyhow::bail!(
                "Unknown config key: {other}. Valid keys: {}",
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// API base URLs, falling back to the public endpoints.
    pub fn endpoints(&self) -> Result<Endpoints> {
        let api = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let infra = self.infra_api_url.as_deref().unwrap_or(DEFAULT_INFRA_API_URL);
        Endpoints::new(api, infra).context("Invalid API URL in profile config")
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

/// Directory holding config and credentials, created on first use.
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".alertsync");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

pub fn load_all(dir: &Path) -> Result<ConfigFile> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn load_profile(dir: &Path, profile: &str) -> Result<ProfileConfig> {
    Ok(load_all(dir)?.remove(profile).unwrap_or_default())
}

pub fn save_profile(dir: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all(dir)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path(dir), content)?;
    Ok(())
}
