pub mod auth;
pub mod clear;
pub mod config;
pub mod download;
pub mod upload;

use alertsync_core::{Policy, PolicyDirectory, PolicyId, find_policy, get_policy};
use anyhow::{Context, Result};

use crate::cli::PolicySelector;

/// Resolves an existing policy from `--policy-name` or `--policy-id`.
pub async fn resolve_policy(
    directory: &dyn PolicyDirectory,
    selector: &PolicySelector,
) -> Result<Policy> {
    match (&selector.policy_id, &selector.policy_name) {
        (Some(id), _) => {
            let id: PolicyId = id.parse()?;
            Ok(get_policy(directory, &id).await?)
        }
        (None, Some(name)) => find_policy(directory, name)
            .await
            .with_context(|| format!("Cannot resolve policy '{name}'")),
        (None, None) => anyhow::bail!("Pass --policy-name or --policy-id"),
    }
}
