use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "alertsync")]
#[command(about = "Keep New Relic alert policies in sync with YAML files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// New Relic admin API key (overrides stored credentials)
    #[arg(long, global = true, env = "NR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "ALERTSYNC_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "ALERTSYNC_LOG", default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update a policy and its conditions from a YAML file
    Upload(UploadArgs),
    /// Write a policy and its conditions out as YAML
    Download(DownloadArgs),
    /// Delete every condition attached to a policy
    Clear(ClearArgs),
    /// Store the API key given with --api-key for the current profile
    Login,
    /// Remove the stored API key
    Logout,
    /// Show which API key is in use
    Whoami,
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct UploadArgs {
    /// Path to the policy document
    pub file: String,
    /// Update this policy instead of looking it up by name
    #[arg(long)]
    pub policy_id: Option<String>,
    /// Template variables as key=value pairs
    #[arg(long, num_args = 1.., value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
    /// Drop condition ids from the file and match by name only
    #[arg(long)]
    pub ignore_ids: bool,
    /// Show the changes without applying them
    #[arg(long)]
    pub dry_run: bool,
}

/// Selects an existing policy by name or id.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct PolicySelector {
    /// Exact policy name
    #[arg(long)]
    pub policy_name: Option<String>,
    /// Policy id
    #[arg(long)]
    pub policy_id: Option<String>,
}

#[derive(Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub policy: PolicySelector,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ClearArgs {
    #[command(flatten)]
    pub policy: PolicySelector,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Key to set (api_url, infra_api_url, format)
    pub key: String,
    /// Value
    pub value: String,
}

/// Parses a `key=value` template variable.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid variable '{raw}', expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid variable '{raw}', key is empty"));
    }
    Ok((key.to_string(), value.to_string()))
}
