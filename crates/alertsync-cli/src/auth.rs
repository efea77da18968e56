use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// API key stored for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub api_key: String,
}

/// Where an API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    Stored,
}

fn creds_path(dir: &Path, profile: &str) -> PathBuf {
    dir.join(format!("credentials.{profile}.json"))
}

pub fn load_credentials(dir: &Path, profile: &str) -> Result<Option<StoredCredentials>> {
    let path = creds_path(dir, profile);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let creds = serde_json::from_str(&content)
        .with_context(|| format!("Invalid credentials file {}", path.display()))?;
    Ok(Some(creds))
}

pub fn save_credentials(dir: &Path, profile: &str, creds: &StoredCredentials) -> Result<()> {
    let content = serde_json::to_string_pretty(creds)?;
    fs::write(creds_path(dir, profile), content)?;
    Ok(())
}

pub fn remove_credentials(dir: &Path, profile: &str) -> Result<bool> {
    let path = creds_path(dir, profile);
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Picks the API key: `--api-key` / `NR_API_KEY` first, then the profile's
/// stored credentials.
pub fn resolve_api_key(
    flag: Option<&str>,
    dir: &Path,
    profile: &str,
) -> Result<(String, KeySource)> {
    if let Some(key) = flag.filter(|k| !k.is_empty()) {
        return Ok((key.to_string(), KeySource::Flag));
    }
    if let Some(creds) = load_credentials(dir, profile)? {
        return Ok((creds.api_key, KeySource::Stored));
    }
    anyhow::bail!(
        "No API key configured. Use --api-key, set NR_API_KEY, or run: alertsync login --api-key <key>"
    )
}

/// Shortens a key for display, keeping only its edges.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
